use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

/// Whether a finding fails the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
	Error,
	Warning,
}

/// The kind of problem a [`Finding`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FindingKind {
	/// Two regions in the source tree share an id.
	DuplicateId,
	/// A managed slot references an id that no region defines.
	MissingSnippet,
	/// A region is never referenced by any managed slot.
	OrphanSnippet,
	/// Snippet markers in a markdown file do not balance.
	UnclosedMarker,
	/// A fenced block of a guarded language is not claimed by any marker.
	UnmarkedBlock,
	/// A generated block no longer matches the lines it references.
	Drift,
	/// A generated marker points at a file that does not exist.
	MissingGeneratedSource,
	/// Region delimiters in a source file are unterminated or mismatched.
	MalformedRegion,
	/// A marker whose payload cannot be interpreted.
	MalformedMarker,
	/// A managed block differs from its snippet (check mode only).
	StaleBlock,
	/// A file could not be read or written.
	FileError,
}

impl FindingKind {
	/// Warnings are surfaced but never fail the report.
	pub fn severity(self) -> Severity {
		match self {
			Self::OrphanSnippet | Self::Drift => Severity::Warning,
			_ => Severity::Error,
		}
	}

	/// Diagnostic code used for rich terminal output.
	pub fn code(self) -> &'static str {
		match self {
			Self::DuplicateId => "snipsync::duplicate_id",
			Self::MissingSnippet => "snipsync::missing_snippet",
			Self::OrphanSnippet => "snipsync::orphan_snippet",
			Self::UnclosedMarker => "snipsync::unclosed_marker",
			Self::UnmarkedBlock => "snipsync::unmarked_block",
			Self::Drift => "snipsync::drift",
			Self::MissingGeneratedSource => "snipsync::missing_generated_source",
			Self::MalformedRegion => "snipsync::malformed_region",
			Self::MalformedMarker => "snipsync::malformed_marker",
			Self::StaleBlock => "snipsync::stale_block",
			Self::FileError => "snipsync::file_error",
		}
	}

	/// A short remediation hint.
	pub fn help(self) -> &'static str {
		match self {
			Self::DuplicateId => "rename one of the regions so every snippet id is unique",
			Self::MissingSnippet => {
				"add a `#region {id}` or `begin-snippet: {id}` region to the source tree, or fix \
				 the id"
			}
			Self::OrphanSnippet => "reference the snippet from a markdown file with `snippet: {id}`",
			Self::UnclosedMarker => {
				"every `<!-- pseudo: -->`, `<!-- invalid: -->` and `<!-- generated: -->` needs a \
				 `<!-- /snippet -->`, every `<!-- snippet: -->` needs a `<!-- endSnippet -->`"
			}
			Self::UnmarkedBlock => {
				"move the code into the source tree and reference it with `snippet: {id}`, or mark \
				 it with `<!-- pseudo:{id} -->`, `<!-- invalid:{id} -->` or `<!-- generated:... -->`"
			}
			Self::Drift => "regenerate the output and paste it into the generated block",
			Self::MissingGeneratedSource => "fix the path in the `generated:` marker",
			Self::MalformedRegion => "close every region with a matching `#endregion` or `end-snippet`",
			Self::MalformedMarker => {
				"use `<!-- generated:path#L{start}-L{end} -->` followed by a fenced block with a \
				 language tag"
			}
			Self::StaleBlock => "run `snipsync update` to synchronize managed blocks",
			Self::FileError => "check that the file exists, is readable, and is valid UTF-8",
		}
	}
}

impl fmt::Display for FindingKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::DuplicateId => "duplicate id",
			Self::MissingSnippet => "missing snippet",
			Self::OrphanSnippet => "orphan snippet",
			Self::UnclosedMarker => "unclosed marker",
			Self::UnmarkedBlock => "unmarked block",
			Self::Drift => "drift",
			Self::MissingGeneratedSource => "missing generated source",
			Self::MalformedRegion => "malformed region",
			Self::MalformedMarker => "malformed marker",
			Self::StaleBlock => "stale block",
			Self::FileError => "file error",
		};
		f.write_str(name)
	}
}

/// A file and 1-indexed line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Location {
	pub file: PathBuf,
	pub line: usize,
}

/// Extra context carried by some findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum FindingDetail {
	/// Text currently at the referenced lines versus text in the document.
	Drift { expected: String, found: String },
	/// Current managed block body versus the canonical rendering.
	Stale { current: String, expected: String },
	/// Both definitions of a duplicated id.
	Duplicate { first: Location, second: Location },
}

/// One reportable outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
	pub severity: Severity,
	pub kind: FindingKind,
	pub file: PathBuf,
	/// 1-indexed line. `None` when the problem belongs to the whole file.
	pub line: Option<usize>,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub detail: Option<FindingDetail>,
}

impl Finding {
	pub fn new(
		kind: FindingKind,
		file: impl Into<PathBuf>,
		line: Option<usize>,
		message: impl Into<String>,
	) -> Self {
		Self {
			severity: kind.severity(),
			kind,
			file: file.into(),
			line,
			message: message.into(),
			detail: None,
		}
	}

	#[must_use]
	pub fn with_detail(mut self, detail: FindingDetail) -> Self {
		self.detail = Some(detail);
		self
	}

	pub fn is_error(&self) -> bool {
		self.severity == Severity::Error
	}
}

/// Final pass/fail outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
	Pass,
	Fail,
}

/// Aggregated result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
	pub verdict: Verdict,
	/// Findings ordered by file, line and kind.
	pub findings: Vec<Finding>,
	/// Number of findings per kind. Kinds with no findings are omitted.
	pub counts: BTreeMap<FindingKind, usize>,
	/// Snippets extracted from the source tree.
	pub snippet_count: usize,
	/// Marker slots found in the documentation tree after synchronization.
	pub slot_count: usize,
	/// Markdown files rewritten (or, in a dry run, that would be).
	pub updated_files: Vec<PathBuf>,
}

impl Report {
	pub fn new(
		mut findings: Vec<Finding>,
		snippet_count: usize,
		slot_count: usize,
		mut updated_files: Vec<PathBuf>,
	) -> Self {
		findings.sort_by(|a, b| {
			a.file
				.cmp(&b.file)
				.then_with(|| a.line.cmp(&b.line))
				.then_with(|| a.kind.cmp(&b.kind))
				.then_with(|| a.message.cmp(&b.message))
		});
		updated_files.sort();

		let mut counts = BTreeMap::new();
		for finding in &findings {
			*counts.entry(finding.kind).or_insert(0) += 1;
		}

		let verdict = if findings.iter().any(Finding::is_error) {
			Verdict::Fail
		} else {
			Verdict::Pass
		};

		Self {
			verdict,
			findings,
			counts,
			snippet_count,
			slot_count,
			updated_files,
		}
	}

	pub fn is_pass(&self) -> bool {
		self.verdict == Verdict::Pass
	}

	/// Number of findings of `kind`.
	pub fn count(&self, kind: FindingKind) -> usize {
		self.counts.get(&kind).copied().unwrap_or(0)
	}

	pub fn errors(&self) -> impl Iterator<Item = &Finding> {
		self.findings.iter().filter(|f| f.is_error())
	}

	pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
		self.findings.iter().filter(|f| !f.is_error())
	}

	pub fn error_count(&self) -> usize {
		self.errors().count()
	}

	pub fn warning_count(&self) -> usize {
		self.warnings().count()
	}

	/// Pretty-printed JSON.
	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}

	/// The same report with every path made relative to `root`.
	#[must_use]
	pub fn relative_to(&self, root: &Path) -> Self {
		let relative = |path: &Path| path.strip_prefix(root).unwrap_or(path).to_path_buf();
		let mut report = self.clone();

		for finding in &mut report.findings {
			finding.file = relative(&finding.file);
			if let Some(FindingDetail::Duplicate { first, second }) = &mut finding.detail {
				first.file = relative(&first.file);
				second.file = relative(&second.file);
			}
		}
		for file in &mut report.updated_files {
			*file = relative(file);
		}

		report
	}

	/// One-line human-readable summary, e.g.
	/// `fail: 2 error(s), 1 warning(s) (1 missing snippet, 1 unmarked block, 1 drift)`.
	pub fn summary(&self) -> String {
		let verdict = match self.verdict {
			Verdict::Pass => "pass",
			Verdict::Fail => "fail",
		};
		let mut line = format!(
			"{verdict}: {} error(s), {} warning(s)",
			self.error_count(),
			self.warning_count()
		);

		if !self.counts.is_empty() {
			let parts: Vec<String> = self
				.counts
				.iter()
				.map(|(kind, count)| format!("{count} {kind}"))
				.collect();
			line.push_str(&format!(" ({})", parts.join(", ")));
		}

		line
	}
}
