mod common;

use common::GREET_BLOCK;
use common::GREETER_CS;
use snipsync_core::AnyEmptyResult;

#[test]
fn update_expands_references() -> AnyEmptyResult {
	let tmp = common::project(&[
		("src/Greeter.cs", GREETER_CS),
		("docs/readme.md", "# Greeter\n\nsnippet: greet\n"),
	])?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Updated 1 file(s)."));

	assert_eq!(
		common::read(tmp.path(), "docs/readme.md")?,
		format!("# Greeter\n\n{GREET_BLOCK}\n")
	);

	common::snipsync_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("All managed blocks are already up to date."));

	Ok(())
}

#[test]
fn update_refreshes_changed_snippets() -> AnyEmptyResult {
	let tmp = common::project(&[
		("src/Greeter.cs", GREETER_CS),
		("readme.md", &format!("{GREET_BLOCK}\n")),
	])?;
	std::fs::write(
		tmp.path().join("src/Greeter.cs"),
		GREETER_CS.replace("Hello!", "Goodbye!"),
	)?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		common::read(tmp.path(), "readme.md")?,
		format!("{}\n", GREET_BLOCK.replace("Hello!", "Goodbye!"))
	);

	Ok(())
}

#[test]
fn update_dry_run_does_not_write() -> AnyEmptyResult {
	let tmp = common::project(&[("src/Greeter.cs", GREETER_CS), ("readme.md", "snippet: greet\n")])?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--dry-run")
		.arg("--diff")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Dry run: would update 1 file(s):"))
		.stdout(predicates::str::contains("  readme.md"))
		.stderr(predicates::str::contains("-snippet: greet"))
		.stderr(predicates::str::contains("+<!-- snippet: greet -->"));

	assert_eq!(common::read(tmp.path(), "readme.md")?, "snippet: greet\n");

	Ok(())
}

#[test]
fn update_without_links() -> AnyEmptyResult {
	let tmp = common::project(&[("src/Greeter.cs", GREETER_CS), ("readme.md", "snippet: greet\n")])?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--no-links")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		common::read(tmp.path(), "readme.md")?,
		"<!-- snippet: greet -->\n```csharp\nConsole.WriteLine(\"Hello!\");\n```\n<!-- endSnippet -->\n"
	);

	Ok(())
}

#[test]
fn update_with_source_and_docs_roots() -> AnyEmptyResult {
	let tmp = common::project(&[
		("samples/Greeter.cs", GREETER_CS),
		("docs/guide.md", "snippet: greet\n"),
		("notes.md", "snippet: greet\n"),
	])?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--source")
		.arg("samples")
		.arg("--docs")
		.arg("docs")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert!(common::read(tmp.path(), "docs/guide.md")?.contains("/samples/Greeter.cs#L6-L6"));
	assert_eq!(common::read(tmp.path(), "notes.md")?, "snippet: greet\n");

	Ok(())
}

#[test]
fn update_keeps_crlf_line_endings() -> AnyEmptyResult {
	let tmp = common::project(&[
		("src/Greeter.cs", GREETER_CS),
		("readme.md", "# Title\r\n\r\nsnippet: greet\r\n"),
	])?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		common::read(tmp.path(), "readme.md")?,
		format!("# Title\n\n{GREET_BLOCK}\n").replace('\n', "\r\n")
	);

	Ok(())
}

#[test]
fn update_fails_on_missing_snippet() -> AnyEmptyResult {
	let tmp = common::project(&[("src/Greeter.cs", GREETER_CS), ("readme.md", "snippet: gone\n")])?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("snippet `gone` is not defined in the source tree"));

	assert_eq!(common::read(tmp.path(), "readme.md")?, "snippet: gone\n");

	Ok(())
}

#[test]
fn update_reports_generated_drift() -> AnyEmptyResult {
	let doc = "<!-- generated:output/run.txt#L1-L2 -->\n```text\nran 3 tests\nall passed\n```\n<!-- /snippet -->\n";
	let tmp = common::project(&[
		("output/run.txt", "ran 4 tests\nall passed\n"),
		("readme.md", doc),
	])?;

	common::snipsync_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("warning[snipsync::drift] readme.md:1:"));

	Ok(())
}
