use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::LanguageRegistry;
use crate::LanguageSpec;
use crate::SnipError;
use crate::SnipResult;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"snipsync.toml",
	".snipsync.toml",
	".config/snipsync.toml",
];

/// Region names that mark editor folds rather than documentation snippets.
pub const DEFAULT_RESERVED_REGIONS: &[&str] = &[
	"Properties",
	"Methods",
	"Fields",
	"Constructors",
	"Constructor",
	"Events",
	"Constants",
	"Private",
	"Public",
	"Internal",
	"Protected",
	"Helpers",
	"Overrides",
	"Interfaces",
	"Members",
	"Nested Types",
];

/// Configuration loaded from a `snipsync.toml` file.
///
/// ```toml
/// source = "samples"
/// docs = "docs"
/// generated_base = "."
/// link_source = true
///
/// [exclude]
/// patterns = ["bin/", "obj/"]
///
/// [include]
/// patterns = ["samples/**", "docs/**"]
///
/// [coverage]
/// languages = ["csharp"]
///
/// [regions]
/// reserved = ["Properties", "Methods"]
///
/// [languages.fsx]
/// fence = "fsharp"
/// comments = ["//"]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct SnipConfig {
	/// Source tree containing snippet regions, relative to the project root.
	#[serde(default)]
	pub source: Option<PathBuf>,
	/// Documentation tree containing markdown files, relative to the project
	/// root.
	#[serde(default)]
	pub docs: Option<PathBuf>,
	/// Base directory that `generated:` marker paths are resolved against.
	#[serde(default)]
	pub generated_base: Option<PathBuf>,
	/// Whether rendered snippets are followed by a link back to their source.
	#[serde(default)]
	pub link_source: Option<bool>,
	/// Maximum file size in bytes to scan.
	#[serde(default)]
	pub max_file_size: Option<u64>,
	/// When true, `.gitignore` rules are not used to filter scanned files.
	#[serde(default)]
	pub disable_gitignore: bool,
	#[serde(default)]
	pub exclude: ExcludeConfig,
	#[serde(default)]
	pub include: IncludeConfig,
	#[serde(default)]
	pub coverage: CoverageConfig,
	#[serde(default)]
	pub regions: RegionsConfig,
	/// Extra or overriding extension mappings keyed by file extension.
	#[serde(default)]
	pub languages: BTreeMap<String, LanguageConfig>,
}

/// Gitignore-style patterns for files and directories to skip in both trees.
#[derive(Debug, Default, Deserialize)]
pub struct ExcludeConfig {
	#[serde(default)]
	pub patterns: Vec<String>,
}

/// Glob patterns restricting which files are scanned. Empty means every
/// file that is not excluded.
#[derive(Debug, Default, Deserialize)]
pub struct IncludeConfig {
	#[serde(default)]
	pub patterns: Vec<String>,
}

/// Which fence languages must always be classified by a marker.
#[derive(Debug, Default, Deserialize)]
pub struct CoverageConfig {
	/// Guarded fence languages. When absent, the languages of the scanned
	/// snippets are guarded.
	#[serde(default)]
	pub languages: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegionsConfig {
	/// Replaces [`DEFAULT_RESERVED_REGIONS`] when present.
	#[serde(default)]
	pub reserved: Option<Vec<String>>,
}

/// A user-defined extension mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageConfig {
	pub fence: String,
	#[serde(default = "default_comments")]
	pub comments: Vec<String>,
	#[serde(default)]
	pub aliases: Vec<String>,
}

fn default_comments() -> Vec<String> {
	vec!["//".to_string()]
}

impl SnipConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> SnipResult<Option<SnipConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		Self::parse(&content).map(Some)
	}

	/// Parse config file contents.
	pub fn parse(content: &str) -> SnipResult<SnipConfig> {
		toml::from_str(content).map_err(|e| SnipError::ConfigParse(e.to_string()))
	}

	/// The default language registry extended with `[languages]` entries.
	pub fn language_registry(&self) -> LanguageRegistry {
		let mut registry = LanguageRegistry::default();
		for (extension, language) in &self.languages {
			registry.insert(
				extension.clone(),
				LanguageSpec {
					fence: language.fence.clone(),
					comments: language.comments.clone(),
					aliases: language.aliases.clone(),
				},
			);
		}
		registry
	}

	/// Reserved region names, falling back to the defaults.
	pub fn reserved_regions(&self) -> Vec<String> {
		self.regions.reserved.clone().unwrap_or_else(|| {
			DEFAULT_RESERVED_REGIONS
				.iter()
				.map(|name| (*name).to_string())
				.collect()
		})
	}
}
