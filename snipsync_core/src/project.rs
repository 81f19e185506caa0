use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use rayon::prelude::*;

use crate::Finding;
use crate::FindingKind;
use crate::LanguageRegistry;
use crate::MarkerScan;
use crate::SnipConfig;
use crate::SnipError;
use crate::SnipResult;
use crate::Snippet;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::marker::parse_markers;
use crate::source_scanner::scan_source_file;

/// Options controlling which files are scanned in both trees.
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Gitignore-style patterns to exclude from scanning.
	pub exclude_patterns: Vec<String>,
	/// When non-empty, only paths (relative to the project root) matching one
	/// of these globs are scanned.
	pub include_set: GlobSet,
	/// Files larger than this many bytes are reported instead of read.
	pub max_file_size: u64,
	/// Whether to disable `.gitignore` integration.
	pub disable_gitignore: bool,
}

impl Default for ScanOptions {
	fn default() -> Self {
		Self {
			exclude_patterns: Vec::new(),
			include_set: GlobSet::empty(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			disable_gitignore: false,
		}
	}
}

impl ScanOptions {
	/// Construct [`ScanOptions`] from a [`SnipConfig`].
	pub fn from_config(config: Option<&SnipConfig>) -> SnipResult<Self> {
		let exclude_patterns = config
			.map(|c| c.exclude.patterns.clone())
			.unwrap_or_default();
		let include_patterns = config.map(|c| &c.include.patterns[..]).unwrap_or_default();
		let max_file_size = config
			.and_then(|c| c.max_file_size)
			.unwrap_or(DEFAULT_MAX_FILE_SIZE);
		let disable_gitignore = config.is_some_and(|c| c.disable_gitignore);

		Ok(Self {
			exclude_patterns,
			include_set: build_glob_set(include_patterns)?,
			max_file_size,
			disable_gitignore,
		})
	}
}

/// Values supplied on the command line that take precedence over the config
/// file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	pub source: Option<PathBuf>,
	pub docs: Option<PathBuf>,
	pub link_source: Option<bool>,
}

/// Everything a run needs to know about the project, resolved once at
/// startup.
#[derive(Debug, Clone)]
pub struct ProjectContext {
	/// Project root: config discovery, `.gitignore` and source links are
	/// relative to it.
	pub root: PathBuf,
	pub source_root: PathBuf,
	pub docs_root: PathBuf,
	/// Base directory for `generated:` marker paths.
	pub generated_base: PathBuf,
	pub link_source: bool,
	pub registry: LanguageRegistry,
	pub reserved_regions: Vec<String>,
	/// Configured guarded languages. `None` guards the languages of the
	/// scanned snippets.
	pub guarded_languages: Option<Vec<String>>,
	pub options: ScanOptions,
}

impl ProjectContext {
	/// Discover `snipsync.toml` under `root` and resolve the project.
	pub fn load(root: &Path, overrides: &Overrides) -> SnipResult<Self> {
		let config = SnipConfig::load(root)?;
		Self::from_config(root, config.as_ref(), overrides)
	}

	/// Resolve the project from an already parsed config.
	pub fn from_config(
		root: &Path,
		config: Option<&SnipConfig>,
		overrides: &Overrides,
	) -> SnipResult<Self> {
		if std::fs::read_dir(root).is_err() {
			return Err(SnipError::ProjectNotFound {
				path: root.display().to_string(),
			});
		}
		let root = root.to_path_buf();
		let resolve = |path: Option<&PathBuf>| path.map_or_else(|| root.clone(), |p| root.join(p));

		let source = overrides
			.source
			.as_ref()
			.or_else(|| config.and_then(|c| c.source.as_ref()));
		let docs = overrides
			.docs
			.as_ref()
			.or_else(|| config.and_then(|c| c.docs.as_ref()));
		let source_root = ensure_dir(&resolve(source), "source")?;
		let docs_root = ensure_dir(&resolve(docs), "docs")?;
		let generated_base = resolve(config.and_then(|c| c.generated_base.as_ref()));

		let link_source = overrides
			.link_source
			.or_else(|| config.and_then(|c| c.link_source))
			.unwrap_or(true);

		let (registry, reserved_regions, guarded_languages) = match config {
			Some(config) => {
				(
					config.language_registry(),
					config.reserved_regions(),
					config.coverage.languages.clone(),
				)
			}
			None => (LanguageRegistry::default(), SnipConfig::default().reserved_regions(), None),
		};

		Ok(Self {
			options: ScanOptions::from_config(config)?,
			root,
			source_root,
			docs_root,
			generated_base,
			link_source,
			registry,
			reserved_regions,
			guarded_languages,
		})
	}

	/// Root used to build source-link lines, or `None` when links are off.
	pub fn link_root(&self) -> Option<&Path> {
		self.link_source.then_some(self.root.as_path())
	}
}

fn ensure_dir(path: &Path, role: &'static str) -> SnipResult<PathBuf> {
	match std::fs::read_dir(path) {
		Ok(_) => Ok(path.to_path_buf()),
		Err(_) => {
			Err(SnipError::RootNotFound {
				role,
				path: path.display().to_string(),
			})
		}
	}
}

/// Snippets and per-file problems collected from the source tree.
#[derive(Debug, Clone, Default)]
pub struct SourceScan {
	/// Snippets ordered by file path, then line.
	pub snippets: Vec<Snippet>,
	pub findings: Vec<Finding>,
	pub file_count: usize,
}

/// A markdown file loaded from the documentation tree.
#[derive(Debug, Clone)]
pub struct Document {
	pub path: PathBuf,
	/// Content with line endings normalized to LF.
	pub content: String,
	/// Whether the file on disk uses CRLF line endings.
	pub crlf: bool,
	pub scan: MarkerScan,
}

impl Document {
	pub fn new(path: PathBuf, raw: &str) -> Self {
		let content = normalize_line_endings(raw);
		let scan = parse_markers(&path, &content);
		Self {
			crlf: raw.contains("\r\n"),
			path,
			content,
			scan,
		}
	}
}

/// Scan every source file with a known extension in parallel. Results are
/// merged in path order once all files are done.
pub fn scan_sources(ctx: &ProjectContext) -> SnipResult<SourceScan> {
	let (files, walk_findings) = collect_files(ctx, &ctx.source_root, |path| {
		ctx.registry.for_path(path).is_some()
	})?;

	let results: Vec<Result<Vec<Snippet>, Finding>> = files
		.par_iter()
		.map(|path| {
			let content = normalize_line_endings(&read_file(path, ctx.options.max_file_size)?);
			let Some(language) = ctx.registry.for_path(path) else {
				return Ok(Vec::new());
			};
			tracing::debug!(file = %path.display(), "scanning source file");

			scan_source_file(path, &content, language, &ctx.reserved_regions).map_err(|error| {
				Finding::new(
					FindingKind::MalformedRegion,
					path,
					Some(error.line),
					error.message,
				)
			})
		})
		.collect();

	let mut scan = SourceScan {
		file_count: files.len(),
		findings: walk_findings,
		..SourceScan::default()
	};
	for result in results {
		match result {
			Ok(snippets) => scan.snippets.extend(snippets),
			Err(finding) => scan.findings.push(finding),
		}
	}

	Ok(scan)
}

/// Load and marker-scan every markdown file in the documentation tree in
/// parallel.
pub fn scan_docs(ctx: &ProjectContext) -> SnipResult<(Vec<Document>, Vec<Finding>)> {
	let (files, mut findings) = collect_files(ctx, &ctx.docs_root, is_markdown_file)?;

	let results: Vec<Result<Document, Finding>> = files
		.par_iter()
		.map(|path| {
			let raw = read_file(path, ctx.options.max_file_size)?;
			tracing::debug!(file = %path.display(), "scanning markdown file");
			Ok(Document::new(path.clone(), &raw))
		})
		.collect();

	let mut documents = Vec::new();
	for result in results {
		match result {
			Ok(document) => documents.push(document),
			Err(finding) => findings.push(finding),
		}
	}

	Ok((documents, findings))
}

/// Read a file as UTF-8, turning any failure into a [`FindingKind::FileError`].
fn read_file(path: &Path, max_file_size: u64) -> Result<String, Finding> {
	let file_error = |message: String| Finding::new(FindingKind::FileError, path, None, message);

	let metadata = std::fs::metadata(path).map_err(|e| file_error(format!("cannot read file: {e}")))?;
	if metadata.len() > max_file_size {
		return Err(file_error(format!(
			"file is {} bytes, larger than the {max_file_size} byte limit",
			metadata.len()
		)));
	}

	std::fs::read_to_string(path).map_err(|e| file_error(format!("cannot read file: {e}")))
}

/// Build a `GlobSet` from a list of glob pattern strings.
fn build_glob_set(patterns: &[String]) -> SnipResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| {
			SnipError::ConfigParse(format!("invalid include pattern `{pattern}`: {e}"))
		})?;
		builder.add(glob);
	}
	builder
		.build()
		.map_err(|e| SnipError::ConfigParse(format!("failed to build include rules: {e}")))
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Build a `Gitignore` matcher from exclude patterns specified in
/// `snipsync.toml` `[exclude]`. These follow `.gitignore` syntax and are
/// applied on top of any `.gitignore` rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> SnipResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			SnipError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| SnipError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

struct Walker<'a, F> {
	root: &'a Path,
	gitignore: Gitignore,
	exclude: Gitignore,
	include: &'a GlobSet,
	accept: F,
	visited: HashSet<PathBuf>,
	files: Vec<PathBuf>,
	/// Directories that could not be listed.
	findings: Vec<Finding>,
}

/// Collect every file under `dir` accepted by `accept`, in sorted order.
///
/// `.gitignore` (unless disabled) and `[exclude]` patterns are matched
/// relative to the project root; `[include]` globs, when present, must match
/// the path relative to the project root. Directories that cannot be read
/// are returned as [`FindingKind::FileError`] findings and skipped.
pub(crate) fn collect_files<F>(
	ctx: &ProjectContext,
	dir: &Path,
	accept: F,
) -> SnipResult<(Vec<PathBuf>, Vec<Finding>)>
where
	F: Fn(&Path) -> bool,
{
	let gitignore = if ctx.options.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(&ctx.root)
	};

	let mut walker = Walker {
		root: &ctx.root,
		gitignore,
		exclude: build_exclude_matcher(&ctx.root, &ctx.options.exclude_patterns)?,
		include: &ctx.options.include_set,
		accept,
		visited: HashSet::new(),
		files: Vec::new(),
		findings: Vec::new(),
	};

	walker.walk(dir);
	let mut files = walker.files;
	files.sort();
	files.dedup();
	Ok((files, walker.findings))
}

impl<F> Walker<'_, F>
where
	F: Fn(&Path) -> bool,
{
	fn walk(&mut self, dir: &Path) {
		// Symlinked directories can point back up the tree.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !self.visited.insert(canonical) {
			tracing::warn!(dir = %dir.display(), "skipping directory already visited");
			return;
		}

		let entries = match std::fs::read_dir(dir) {
			Ok(entries) => entries,
			Err(error) => {
				tracing::warn!(dir = %dir.display(), %error, "skipping unreadable directory");
				self.unreadable(dir, &error);
				return;
			}
		};

		let mut paths = Vec::new();
		for entry in entries {
			match entry {
				Ok(entry) => paths.push(entry.path()),
				Err(error) => self.unreadable(dir, &error),
			}
		}

		for path in paths {
			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if is_ignored_directory_name(name) && path.is_dir() {
					continue;
				}
			}

			let is_dir = path.is_dir();
			if self.gitignore.matched(&path, is_dir).is_ignore()
				|| self.exclude.matched(&path, is_dir).is_ignore()
			{
				continue;
			}

			if is_dir {
				self.walk(&path);
			} else if (self.accept)(&path) && self.is_included(&path) {
				self.files.push(path);
			}
		}
	}

	fn unreadable(&mut self, dir: &Path, error: &std::io::Error) {
		self.findings.push(Finding::new(
			FindingKind::FileError,
			dir,
			None,
			format!("cannot read directory: {error}"),
		));
	}

	fn is_included(&self, path: &Path) -> bool {
		if self.include.is_empty() {
			return true;
		}

		let relative = path.strip_prefix(self.root).unwrap_or(path);
		self.include.is_match(relative)
	}
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || matches!(name, "node_modules" | "target" | "bin" | "obj")
}

/// Check if a file is a markdown document.
pub fn is_markdown_file(path: &Path) -> bool {
	let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
		return false;
	};

	matches!(ext.to_ascii_lowercase().as_str(), "md" | "mdx" | "markdown")
}
