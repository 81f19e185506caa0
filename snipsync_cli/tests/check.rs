mod common;

use common::GREET_BLOCK;
use common::GREETER_CS;
use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;
use snipsync_core::AnyEmptyResult;

#[test]
fn check_passes_when_up_to_date() -> AnyEmptyResult {
	let doc = format!("# Greeter\n\n{GREET_BLOCK}\n");
	let tmp = common::project(&[("src/Greeter.cs", GREETER_CS), ("docs/readme.md", &doc)])?;

	common::snipsync_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Check passed: 1 snippet(s), 1 slot(s)."));

	Ok(())
}

#[test]
fn check_fails_when_stale() -> AnyEmptyResult {
	let stale = "<!-- snippet: greet -->\n```csharp\nold();\n```\n<!-- endSnippet -->\n";
	let tmp = common::project(&[("src/Greeter.cs", GREETER_CS), ("readme.md", stale)])?;

	common::snipsync_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains(
			"error[snipsync::stale_block] readme.md:1: managed block `greet` is out of date",
		))
		.stderr(predicates::str::contains("Check failed."))
		.stderr(predicates::str::contains("1 stale block"));

	assert_eq!(common::read(tmp.path(), "readme.md")?, stale);

	Ok(())
}

#[test]
fn check_diff_shows_changes() -> AnyEmptyResult {
	let stale = "<!-- snippet: greet -->\n```csharp\nold();\n```\n<!-- endSnippet -->\n";
	let tmp = common::project(&[("src/Greeter.cs", GREETER_CS), ("readme.md", stale)])?;

	common::snipsync_cmd()
		.arg("check")
		.arg("--diff")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("-old();"))
		.stderr(predicates::str::contains("+Console.WriteLine(\"Hello!\");"));

	Ok(())
}

#[test]
fn check_json_output() -> AnyEmptyResult {
	let tmp = common::project(&[("src/Greeter.cs", GREETER_CS), ("readme.md", "snippet: nope\n")])?;

	let output = common::snipsync_cmd()
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.get_output()
		.stdout
		.clone();

	let report: Value = serde_json::from_slice(&output)?;
	assert_eq!(report["verdict"], "fail");
	assert_eq!(report["snippet_count"], 1);
	assert_eq!(report["counts"]["missing_snippet"], 1);
	assert_eq!(report["counts"]["orphan_snippet"], 1);

	let findings = report["findings"]
		.as_array()
		.ok_or("findings should be an array")?;
	let missing = findings
		.iter()
		.find(|finding| finding["kind"] == "missing_snippet")
		.ok_or("missing snippet finding")?;
	assert_eq!(missing["file"], "readme.md");
	assert_eq!(missing["line"], 1);
	assert_eq!(missing["severity"], "error");

	Ok(())
}

#[test]
fn check_github_output() -> AnyEmptyResult {
	let tmp = common::project(&[("src/Greeter.cs", GREETER_CS), ("readme.md", "snippet: nope\n")])?;

	common::snipsync_cmd()
		.arg("check")
		.arg("--format")
		.arg("github")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stdout(predicates::str::contains(
			"::error file=readme.md,line=1::snippet `nope` is not defined in the source tree",
		))
		.stdout(predicates::str::contains("::warning file=src/Greeter.cs,line=6::"));

	Ok(())
}

#[test]
fn check_warnings_do_not_fail() -> AnyEmptyResult {
	let tmp = common::project(&[("src/Greeter.cs", GREETER_CS), ("readme.md", "# Nothing\n")])?;

	common::snipsync_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Check passed"))
		.stdout(predicates::str::contains("1 orphan snippet"))
		.stderr(predicates::str::contains("warning[snipsync::orphan_snippet]"));

	Ok(())
}

#[test]
fn check_reports_unmarked_code_blocks() -> AnyEmptyResult {
	let doc = format!("{GREET_BLOCK}\n\n```cs\nLoose();\n```\n\n<!-- pseudo:idea -->\n```cs\nIdea();\n```\n<!-- /snippet -->\n");
	let tmp = common::project(&[("src/Greeter.cs", GREETER_CS), ("readme.md", &doc)])?;

	common::snipsync_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("error[snipsync::unmarked_block] readme.md:8:"))
		.stderr(predicates::str::contains("readme.md:13").not());

	Ok(())
}

#[test]
fn check_reports_unbalanced_markers() -> AnyEmptyResult {
	let doc = "<!-- invalid:broken -->\n```text\nnope\n```\n";
	let tmp = common::project(&[("readme.md", doc)])?;

	common::snipsync_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("error[snipsync::unclosed_marker] readme.md:"));

	Ok(())
}

#[test]
fn check_exits_with_2_for_missing_root() -> AnyEmptyResult {
	let tmp = common::project(&[("readme.md", "# Doc\n")])?;

	common::snipsync_cmd()
		.arg("check")
		.arg("--source")
		.arg("does-not-exist")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("snipsync::root_not_found"));

	Ok(())
}
