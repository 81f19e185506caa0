#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;
use tempfile::TempDir;

pub const GREETER_CS: &str = r#"namespace Samples;

public class Greeter
{
    #region greet
    Console.WriteLine("Hello!");
    #endregion
}
"#;

pub const GREET_BLOCK: &str = "<!-- snippet: greet -->
```csharp
Console.WriteLine(\"Hello!\");
```
<sup>[snippet source](/src/Greeter.cs#L6-L6)</sup>
<!-- endSnippet -->";

pub fn snipsync_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("snipsync"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("SNIPSYNC_LOG");
	cmd
}

/// A temporary project containing `files`.
pub fn project(files: &[(&str, &str)]) -> std::io::Result<TempDir> {
	let tmp = tempfile::tempdir()?;
	for (relative, content) in files {
		let path = tmp.path().join(relative);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, content)?;
	}
	Ok(tmp)
}

pub fn read(root: &Path, relative: &str) -> std::io::Result<String> {
	std::fs::read_to_string(root.join(relative))
}
