mod common;

use common::GREET_BLOCK;
use common::GREETER_CS;
use snipsync_core::AnyEmptyResult;

#[test]
fn list_shows_snippets_and_slots() -> AnyEmptyResult {
	let doc = format!(
		"{GREET_BLOCK}\n\nsnippet: missing\n\n<!-- generated:out.txt#L1-L2 -->\n```text\nx\n```\n<!-- /snippet -->\n"
	);
	let tmp = common::project(&[
		("src/Greeter.cs", GREETER_CS),
		("src/Other.cs", "// begin-snippet: other\nOther();\n// end-snippet\n"),
		("readme.md", &doc),
	])?;

	common::snipsync_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Snippets:"))
		.stdout(predicates::str::contains("  greet [csharp] src/Greeter.cs:6-6 (1 reference(s))"))
		.stdout(predicates::str::contains("  other [csharp] src/Other.cs:2-2 (orphan)"))
		.stdout(predicates::str::contains("Slots:"))
		.stdout(predicates::str::contains("  snippet greet readme.md:1"))
		.stdout(predicates::str::contains("  reference missing readme.md:8 [missing]"))
		.stdout(predicates::str::contains("  generated out.txt#L1-L2 readme.md:10"))
		.stdout(predicates::str::contains("2 snippet(s), 3 slot(s)"));

	Ok(())
}

#[test]
fn list_empty_project() -> AnyEmptyResult {
	let tmp = common::project(&[("readme.md", "# Nothing\n")])?;

	common::snipsync_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No snippets or slots found."));

	Ok(())
}
