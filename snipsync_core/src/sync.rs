use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::Document;
use crate::Finding;
use crate::FindingDetail;
use crate::FindingKind;
use crate::SlotKind;
use crate::Snippet;
use crate::SnippetIndex;
use crate::fence::fence_for;

/// Whether the synchronizer rewrites documents or only reports differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
	Update,
	Check,
}

/// A document whose managed blocks changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpdate {
	pub path: PathBuf,
	/// LF content before synchronization.
	pub original: String,
	/// LF content after synchronization.
	pub updated: String,
	/// Restore CRLF line endings when writing.
	pub crlf: bool,
}

impl DocumentUpdate {
	/// The content to write to disk, in the file's original line ending style.
	pub fn output(&self) -> String {
		if self.crlf {
			self.updated.replace('\n', "\r\n")
		} else {
			self.updated.clone()
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
	/// Documents that changed, in path order. Always empty in check mode.
	pub updates: Vec<DocumentUpdate>,
	pub findings: Vec<Finding>,
	/// Number of managed slots referencing each snippet id.
	pub references: BTreeMap<String, usize>,
}

/// The canonical body of a managed block for `snippet`: the fenced content
/// and, when `link_root` is set, a link back to the source lines.
pub fn render_block(snippet: &Snippet, link_root: Option<&Path>) -> String {
	let fence = fence_for(&snippet.content);
	let mut body = format!("{fence}{}\n{}{fence}\n", snippet.language, snippet.content);

	if let Some(root) = link_root {
		body.push_str(&format!(
			"<sup>[snippet source](/{}#L{}-L{})</sup>\n",
			link_path(root, &snippet.file),
			snippet.start_line,
			snippet.end_line,
		));
	}

	body
}

/// Forward-slash path of `file` relative to `root`.
fn link_path(root: &Path, file: &Path) -> String {
	let relative = file.strip_prefix(root).unwrap_or(file);
	relative
		.components()
		.map(|component| component.as_os_str().to_string_lossy())
		.collect::<Vec<_>>()
		.join("/")
}

/// Bring every managed slot in `documents` in line with `index`.
///
/// Slots are visited in document order and each document is rebuilt from a
/// cursor, so replacement spans never need adjusting. Snippets that no
/// managed slot references are reported once all documents are visited.
pub fn synchronize(
	index: &SnippetIndex,
	documents: &[Document],
	link_root: Option<&Path>,
	mode: SyncMode,
) -> SyncOutcome {
	let mut outcome = SyncOutcome::default();

	for document in documents {
		let content = &document.content;
		let mut output = String::with_capacity(content.len());
		let mut cursor = 0;
		let mut changed = false;

		for slot in document.scan.slots.iter().filter(|slot| slot.kind.is_managed()) {
			let Some(id) = slot.kind.id() else {
				continue;
			};

			let Some(snippet) = index.get(id) else {
				outcome.findings.push(Finding::new(
					FindingKind::MissingSnippet,
					&document.path,
					Some(slot.line),
					format!("snippet `{id}` is not defined in the source tree"),
				));
				continue;
			};
			*outcome.references.entry(id.to_string()).or_insert(0) += 1;

			let body = render_block(snippet, link_root);
			let (span, replacement) = match &slot.kind {
				SlotKind::ManagedBlock { .. } => {
					if slot.rendered.as_deref() == Some(body.as_str()) {
						continue;
					}
					(slot.body.clone(), body)
				}
				_ => {
					(
						slot.span.clone(),
						format!("<!-- snippet: {id} -->\n{body}<!-- endSnippet -->"),
					)
				}
			};

			if mode == SyncMode::Check {
				let current = content[span.clone()].to_string();
				let message = if matches!(slot.kind, SlotKind::ManagedReference { .. }) {
					format!("`snippet: {id}` has not been expanded")
				} else {
					format!("managed block `{id}` is out of date")
				};
				outcome.findings.push(
					Finding::new(FindingKind::StaleBlock, &document.path, Some(slot.line), message)
						.with_detail(FindingDetail::Stale {
							current,
							expected: replacement,
						}),
				);
				continue;
			}

			// Overlaps a span that was already replaced.
			if span.start < cursor {
				continue;
			}

			output.push_str(&content[cursor..span.start]);
			output.push_str(&replacement);
			cursor = span.end;
			changed = true;
		}

		if changed {
			output.push_str(&content[cursor..]);
			outcome.updates.push(DocumentUpdate {
				path: document.path.clone(),
				original: content.clone(),
				updated: output,
				crlf: document.crlf,
			});
		}
	}

	for (id, snippet) in index.iter() {
		if !outcome.references.contains_key(id) {
			outcome.findings.push(Finding::new(
				FindingKind::OrphanSnippet,
				&snippet.file,
				Some(snippet.start_line),
				format!("snippet `{id}` is not referenced by any document"),
			));
		}
	}

	outcome
}

/// Write every update atomically. Failures become
/// [`FindingKind::FileError`] findings; the remaining files are still
/// written.
pub fn write_updates(updates: &[DocumentUpdate]) -> Vec<Finding> {
	let mut findings = Vec::new();

	for update in updates {
		match write_atomic(&update.path, &update.output()) {
			Ok(()) => tracing::info!(file = %update.path.display(), "updated managed blocks"),
			Err(error) => {
				findings.push(Finding::new(
					FindingKind::FileError,
					&update.path,
					None,
					format!("cannot write file: {error}"),
				));
			}
		}
	}

	findings
}

/// Write to a temporary sibling, then rename over the target.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
	let file_name = path
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_default();
	let temp_path = path.with_file_name(format!(
		".{file_name}.tmp-{}-{}",
		std::process::id(),
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_or(0, |duration| duration.as_nanos())
	));

	std::fs::write(&temp_path, content)?;
	if let Err(error) = std::fs::rename(&temp_path, path) {
		let _ = std::fs::remove_file(&temp_path);
		return Err(error);
	}

	Ok(())
}
