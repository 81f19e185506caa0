use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::LanguageRegistry;
use crate::LanguageSpec;
use crate::Overrides;
use crate::ProjectContext;
use crate::SnipConfig;
use crate::Snippet;

pub(crate) const GREETER_CS: &str = r#"namespace Samples;

public class Greeter
{
    #region greet
    Console.WriteLine("Hello!");
    #endregion
}
"#;

pub(crate) const GREET_BLOCK: &str = "<!-- snippet: greet -->
```csharp
Console.WriteLine(\"Hello!\");
```
<sup>[snippet source](/src/Greeter.cs#L6-L6)</sup>
<!-- endSnippet -->";

pub(crate) fn write_file(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

pub(crate) fn read_file(root: &Path, relative: &str) -> String {
	std::fs::read_to_string(root.join(relative)).unwrap_or_else(|e| panic!("read: {e}"))
}

/// A temporary project containing `files`.
pub(crate) fn project(files: &[(&str, &str)]) -> TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	for (relative, content) in files {
		write_file(tmp.path(), relative, content);
	}
	tmp
}

pub(crate) fn context(root: &Path) -> ProjectContext {
	ProjectContext::load(root, &Overrides::default()).unwrap_or_else(|e| panic!("context: {e}"))
}

pub(crate) fn csharp() -> LanguageSpec {
	LanguageRegistry::default()
		.for_path(Path::new("Sample.cs"))
		.cloned()
		.unwrap_or_else(|| panic!("csharp is registered by default"))
}

pub(crate) fn reserved() -> Vec<String> {
	SnipConfig::default().reserved_regions()
}

pub(crate) fn snippet(id: &str, file: &str, lines: (usize, usize), content: &str) -> Snippet {
	Snippet {
		id: id.to_string(),
		file: PathBuf::from(file),
		start_line: lines.0,
		end_line: lines.1,
		language: "csharp".to_string(),
		content: content.to_string(),
	}
}
