mod common;

use common::GREETER_CS;
use rstest::rstest;
use snipsync_core::AnyEmptyResult;

#[rstest]
#[case::root("snipsync.toml")]
#[case::dotfile(".snipsync.toml")]
#[case::config_dir(".config/snipsync.toml")]
fn config_candidates_are_discovered(#[case] config_path: &str) -> AnyEmptyResult {
	let tmp = common::project(&[
		(config_path, "link_source = false\n"),
		("src/Greeter.cs", GREETER_CS),
		("readme.md", "snippet: greet\n"),
	])?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let content = common::read(tmp.path(), "readme.md")?;
	assert!(!content.contains("<sup>"), "{content}");

	Ok(())
}

#[test]
fn root_config_takes_precedence() -> AnyEmptyResult {
	let tmp = common::project(&[
		("snipsync.toml", "link_source = true\n"),
		(".config/snipsync.toml", "link_source = false\n"),
		("src/Greeter.cs", GREETER_CS),
		("readme.md", "snippet: greet\n"),
	])?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert!(common::read(tmp.path(), "readme.md")?.contains("<sup>[snippet source]"));

	Ok(())
}

#[test]
fn configured_roots_are_used() -> AnyEmptyResult {
	let tmp = common::project(&[
		("snipsync.toml", "source = \"samples\"\ndocs = \"docs\"\n"),
		("samples/Greeter.cs", GREETER_CS),
		("docs/readme.md", "snippet: greet\n"),
	])?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert!(common::read(tmp.path(), "docs/readme.md")?.contains("/samples/Greeter.cs#L6-L6"));

	Ok(())
}

#[test]
fn invalid_config_exits_with_2() -> AnyEmptyResult {
	let tmp = common::project(&[("snipsync.toml", "source = [\n")])?;

	common::snipsync_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("snipsync::config_parse"));

	Ok(())
}
