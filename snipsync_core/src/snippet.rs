use std::collections::BTreeMap;
use std::path::PathBuf;

use derive_more::Deref;
use serde::Serialize;

use crate::Finding;
use crate::FindingDetail;
use crate::FindingKind;
use crate::Location;

/// A named code span extracted from a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
	pub id: String,
	/// The source file the region was found in.
	pub file: PathBuf,
	/// 1-indexed first line of the content.
	pub start_line: usize,
	/// 1-indexed last line of the content (inclusive).
	pub end_line: usize,
	/// Canonical fence tag of the source language.
	pub language: String,
	/// Dedented text with exactly one trailing newline (empty for an empty
	/// region).
	pub content: String,
}

impl Snippet {
	pub fn location(&self) -> Location {
		Location {
			file: self.file.clone(),
			line: self.start_line,
		}
	}
}

/// Immutable `id → Snippet` snapshot built once all source files are
/// scanned.
#[derive(Debug, Clone, Default, Deref)]
pub struct SnippetIndex(BTreeMap<String, Snippet>);

impl SnippetIndex {
	/// Build the index from every snippet in the tree. Snippets must already
	/// be ordered by file and line; the first definition of an id wins.
	///
	/// Every pair of definitions sharing an id is reported once as a
	/// [`FindingKind::DuplicateId`], attributed to the later definition.
	pub fn build(snippets: Vec<Snippet>) -> (Self, Vec<Finding>) {
		let mut map: BTreeMap<String, Snippet> = BTreeMap::new();
		let mut seen: BTreeMap<String, Vec<Location>> = BTreeMap::new();
		let mut findings = Vec::new();

		for snippet in snippets {
			let second = snippet.location();
			let earlier = seen.entry(snippet.id.clone()).or_default();
			for first in earlier.iter() {
				findings.push(
					Finding::new(
						FindingKind::DuplicateId,
						&snippet.file,
						Some(snippet.start_line),
						format!(
							"duplicate snippet `{}`: defined in `{}:{}` and `{}:{}`",
							snippet.id,
							first.file.display(),
							first.line,
							second.file.display(),
							second.line,
						),
					)
					.with_detail(FindingDetail::Duplicate {
						first: first.clone(),
						second: second.clone(),
					}),
				);
			}
			earlier.push(second);

			map.entry(snippet.id.clone()).or_insert(snippet);
		}

		(Self(map), findings)
	}
}
