mod common;

use snipsync_core::AnyEmptyResult;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::snipsync_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created"))
		.stdout(predicates::str::contains("snippet: my-id"));

	let config = std::fs::read_to_string(tmp.path().join("snipsync.toml"))?;
	assert!(config.contains("# [coverage]"));
	assert!(config.contains("# [regions]"));

	// The generated sample must itself be a valid config.
	common::snipsync_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join(".snipsync.toml"), "link_source = false\n")?;

	common::snipsync_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already exists"));

	assert!(!tmp.path().join("snipsync.toml").exists());
	assert_eq!(
		std::fs::read_to_string(tmp.path().join(".snipsync.toml"))?,
		"link_source = false\n"
	);

	Ok(())
}
