use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

/// How a source language is tagged in markdown fences and which line-comment
/// prefixes may precede a snippet delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSpec {
	/// Canonical fence tag, e.g. `csharp`.
	pub fence: String,
	/// Line-comment prefixes, longest first.
	pub comments: Vec<String>,
	/// Other fence tags that refer to the same language (`cs`, `c#`).
	#[serde(default)]
	pub aliases: Vec<String>,
}

impl LanguageSpec {
	fn new(fence: &str, comments: &[&str], aliases: &[&str]) -> Self {
		let mut comments: Vec<String> = comments.iter().map(|c| (*c).to_string()).collect();
		comments.sort_by_key(|c| std::cmp::Reverse(c.len()));
		Self {
			fence: fence.to_string(),
			comments,
			aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
		}
	}

	/// Strip leading whitespace and at most one comment prefix, returning the
	/// remaining text with surrounding whitespace removed.
	pub fn strip_comment<'a>(&self, line: &'a str) -> &'a str {
		let trimmed = line.trim_start();
		for prefix in &self.comments {
			if let Some(rest) = trimmed.strip_prefix(prefix.as_str()) {
				return rest.trim();
			}
		}
		trimmed.trim_end()
	}
}

/// Extension → language table used by both scanners.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
	by_extension: BTreeMap<String, LanguageSpec>,
}

impl Default for LanguageRegistry {
	fn default() -> Self {
		let slash = ["//"];
		let hash = ["#"];
		let entries = [
			("cs", LanguageSpec::new("csharp", &slash, &["cs", "c#"])),
			("csx", LanguageSpec::new("csharp", &slash, &["cs", "c#"])),
			("fs", LanguageSpec::new("fsharp", &slash, &["f#"])),
			("vb", LanguageSpec::new("vb", &["'"], &["vbnet"])),
			("rs", LanguageSpec::new("rust", &slash, &["rs"])),
			("ts", LanguageSpec::new("typescript", &slash, &["ts"])),
			("tsx", LanguageSpec::new("tsx", &slash, &[])),
			("js", LanguageSpec::new("javascript", &slash, &["js"])),
			("jsx", LanguageSpec::new("jsx", &slash, &[])),
			("py", LanguageSpec::new("python", &hash, &["py"])),
			("go", LanguageSpec::new("go", &slash, &["golang"])),
			("java", LanguageSpec::new("java", &slash, &[])),
			("kt", LanguageSpec::new("kotlin", &slash, &["kt"])),
			("swift", LanguageSpec::new("swift", &slash, &[])),
			("c", LanguageSpec::new("c", &slash, &[])),
			("h", LanguageSpec::new("c", &slash, &[])),
			("cpp", LanguageSpec::new("cpp", &slash, &["c++"])),
			("sh", LanguageSpec::new("bash", &hash, &["sh", "shell"])),
			("ps1", LanguageSpec::new("powershell", &hash, &["ps1", "pwsh"])),
			("sql", LanguageSpec::new("sql", &["--"], &[])),
			("yaml", LanguageSpec::new("yaml", &hash, &["yml"])),
			("yml", LanguageSpec::new("yaml", &hash, &["yml"])),
			("toml", LanguageSpec::new("toml", &hash, &[])),
			("xml", LanguageSpec::new("xml", &["<!--"], &[])),
			("csproj", LanguageSpec::new("xml", &["<!--"], &[])),
		];

		Self {
			by_extension: entries
				.into_iter()
				.map(|(ext, spec)| (ext.to_string(), spec))
				.collect(),
		}
	}
}

impl LanguageRegistry {
	/// Add or replace the language used for files with `extension`.
	pub fn insert(&mut self, extension: impl Into<String>, spec: LanguageSpec) {
		let mut spec = spec;
		spec.comments.sort_by_key(|c| std::cmp::Reverse(c.len()));
		self.by_extension
			.insert(extension.into().trim_start_matches('.').to_string(), spec);
	}

	/// The language of a source file, if its extension is known.
	pub fn for_path(&self, path: &Path) -> Option<&LanguageSpec> {
		let ext = path.extension().and_then(|e| e.to_str())?;
		self.by_extension.get(&ext.to_ascii_lowercase())
	}

	/// Resolve a fence info string (`cs`, `C#`, `csharp title="x"`) to the
	/// canonical fence tag. Unknown tags resolve to themselves, lowercased.
	pub fn canonical_fence(&self, info: &str) -> Option<String> {
		let tag = info
			.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
			.next()
			.unwrap_or_default()
			.to_ascii_lowercase();
		if tag.is_empty() {
			return None;
		}

		let known = self.by_extension.values().find(|spec| {
			spec.fence == tag || spec.aliases.iter().any(|alias| *alias == tag)
		});
		Some(known.map_or(tag, |spec| spec.fence.clone()))
	}
}
