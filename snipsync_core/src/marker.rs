use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::Finding;
use crate::FindingKind;
use crate::fence::FenceOpen;

/// A `path#L{start}-L{end}` reference carried by a generated marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedRef {
	pub path: String,
	/// 1-indexed, inclusive.
	pub start_line: usize,
	/// 1-indexed, inclusive.
	pub end_line: usize,
}

impl GeneratedRef {
	/// Parse `path#L10-L12` or `path#L10`.
	pub fn parse(text: &str) -> Option<Self> {
		let (path, range) = text.trim().rsplit_once('#')?;
		if path.is_empty() {
			return None;
		}

		let (start, end) = match range.split_once('-') {
			Some((start, end)) => (start, end),
			None => (range, range),
		};
		let start_line: usize = start.strip_prefix('L')?.parse().ok()?;
		let end_line: usize = end.strip_prefix('L')?.parse().ok()?;

		if start_line == 0 || start_line > end_line {
			return None;
		}

		Some(Self {
			path: path.to_string(),
			start_line,
			end_line,
		})
	}
}

impl fmt::Display for GeneratedRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#L{}-L{}", self.path, self.start_line, self.end_line)
	}
}

/// What a slot is and the payload that identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotKind {
	/// A bare `snippet: {id}` line waiting to be expanded.
	ManagedReference { id: String },
	/// An expanded `<!-- snippet: {id} -->` … `<!-- endSnippet -->` block.
	ManagedBlock { id: String },
	/// Illustrative code that is not expected to compile.
	Pseudo { id: String },
	/// Code that is intentionally wrong.
	Invalid { id: String },
	/// Output copied from a file and line range.
	Generated { reference: GeneratedRef },
}

impl SlotKind {
	/// The snippet id, for every kind except generated.
	pub fn id(&self) -> Option<&str> {
		match self {
			Self::ManagedReference { id }
			| Self::ManagedBlock { id }
			| Self::Pseudo { id }
			| Self::Invalid { id } => Some(id),
			Self::Generated { .. } => None,
		}
	}

	/// Whether the synchronizer owns this slot's content.
	pub fn is_managed(&self) -> bool {
		matches!(self, Self::ManagedReference { .. } | Self::ManagedBlock { .. })
	}

	/// Whether code blocks inside this slot count as classified.
	pub fn claims_code(&self) -> bool {
		!matches!(self, Self::ManagedReference { .. })
	}

	pub fn label(&self) -> &'static str {
		match self {
			Self::ManagedReference { .. } => "reference",
			Self::ManagedBlock { .. } => "snippet",
			Self::Pseudo { .. } => "pseudo",
			Self::Invalid { .. } => "invalid",
			Self::Generated { .. } => "generated",
		}
	}
}

/// The first fenced code block inside a slot's body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FencedBlock {
	/// Full info string after the opening fence.
	pub info: String,
	/// First word of the info string.
	pub language: Option<String>,
	/// Text between the fences, each line ending in a newline.
	pub content: String,
	/// 1-indexed line of the opening fence.
	pub line: usize,
}

/// A placeholder or managed block inside a markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkdownSlot {
	pub kind: SlotKind,
	pub file: PathBuf,
	/// Byte span from the start of the opening line to the end of the
	/// closing line, without its newline.
	pub span: Range<usize>,
	/// Byte span between the opening line (including its newline) and the
	/// start of the closing line. Empty for a managed reference.
	pub body: Range<usize>,
	/// 1-indexed line of the opening delimiter.
	pub line: usize,
	/// 1-indexed line of the closing delimiter.
	pub end_line: usize,
	/// Current body text. `None` for a managed reference.
	pub rendered: Option<String>,
	pub fence: Option<FencedBlock>,
}

impl MarkdownSlot {
	/// Whether a 1-indexed line lies between the slot's delimiters
	/// (inclusive).
	pub fn contains_line(&self, line: usize) -> bool {
		self.line <= line && line <= self.end_line
	}
}

/// Slots and marker problems found in one document.
#[derive(Debug, Clone, Default)]
pub struct MarkerScan {
	/// Slots in document order (by opening line).
	pub slots: Vec<MarkdownSlot>,
	pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManualKind {
	Pseudo,
	Invalid,
	Generated,
}

#[derive(Debug)]
enum MarkerLine<'a> {
	Reference(&'a str),
	ManagedOpen(&'a str),
	ManagedClose,
	ManualOpen(ManualKind, &'a str),
	ManualClose,
}

/// An opened marker waiting for its closing delimiter.
struct PendingSlot {
	/// `None` when the opening marker was malformed; it still has to balance.
	kind: Option<SlotKind>,
	line: usize,
	line_start: usize,
	body_start: usize,
}

/// A fenced block seen during the pass, keyed by its opening byte offset.
struct SeenFence {
	offset: usize,
	block: FencedBlock,
}

struct OpenFence {
	fence: FenceOpen,
	line: usize,
	offset: usize,
	content_start: usize,
}

/// Scan one markdown document (LF line endings) for snippet markers.
///
/// This is a single sequential pass over lines, not a markdown parse.
/// Markers are recognized on a line of their own and never inside a fenced
/// code block. A `<!-- /snippet -->` closes the most recently opened manual
/// marker; any imbalance between manual opens and closes is reported once
/// for the whole file.
pub fn parse_markers(file: &Path, content: &str) -> MarkerScan {
	let mut scan = MarkerScan::default();
	let mut fences: Vec<SeenFence> = Vec::new();
	let mut open_fence: Option<OpenFence> = None;
	let mut managed: Option<PendingSlot> = None;
	let mut manual: Vec<PendingSlot> = Vec::new();
	let mut manual_opens = 0usize;
	let mut manual_closes = 0usize;
	let mut unbalanced = false;

	let mut offset = 0;
	for (index, raw_line) in content.split_inclusive('\n').enumerate() {
		let line_number = index + 1;
		let line_start = offset;
		let text = raw_line.strip_suffix('\n').unwrap_or(raw_line);
		let line_end = line_start + text.len();
		offset += raw_line.len();

		if let Some(open) = &open_fence {
			if open.fence.is_closed_by(text) {
				fences.push(SeenFence {
					offset: open.offset,
					block: FencedBlock {
						language: open.fence.language().map(str::to_string),
						info: open.fence.info.clone(),
						content: content[open.content_start..line_start].to_string(),
						line: open.line,
					},
				});
				open_fence = None;
			}
			continue;
		}

		if let Some(fence) = FenceOpen::parse(text) {
			open_fence = Some(OpenFence {
				fence,
				line: line_number,
				offset: line_start,
				content_start: offset,
			});
			continue;
		}

		let Some(marker) = classify_marker(text.trim()) else {
			continue;
		};

		match marker {
			// Inside an open managed block a reference line is body text.
			MarkerLine::Reference(_) if managed.is_some() => {}
			MarkerLine::Reference(id) => {
				scan.slots.push(MarkdownSlot {
					kind: SlotKind::ManagedReference { id: id.to_string() },
					file: file.to_path_buf(),
					span: line_start..line_end,
					body: line_end..line_end,
					line: line_number,
					end_line: line_number,
					rendered: None,
					fence: None,
				});
			}
			MarkerLine::ManagedOpen(id) => {
				if let Some(previous) = managed.take() {
					scan.findings.push(unclosed_managed(file, &previous));
				}
				let kind = if is_valid_id(id) {
					Some(SlotKind::ManagedBlock { id: id.to_string() })
				} else {
					scan.findings.push(malformed(
						file,
						line_number,
						format!("`<!-- snippet: {id} -->` needs a single-word snippet id"),
					));
					None
				};
				managed = Some(PendingSlot {
					kind,
					line: line_number,
					line_start,
					body_start: offset,
				});
			}
			MarkerLine::ManagedClose => {
				let Some(pending) = managed.take() else {
					scan.findings.push(Finding::new(
						FindingKind::UnclosedMarker,
						file,
						Some(line_number),
						"`<!-- endSnippet -->` without an opening `<!-- snippet: {id} -->`",
					));
					continue;
				};
				if let Some(slot) = close_slot(file, content, pending, &fences, line_number, line_start, line_end) {
					scan.slots.push(slot);
				}
			}
			MarkerLine::ManualOpen(kind, payload) => {
				manual_opens += 1;
				let kind = manual_slot_kind(kind, payload);
				if kind.is_none() {
					scan.findings.push(malformed(
						file,
						line_number,
						format!("cannot interpret marker `{}`", text.trim()),
					));
				}
				manual.push(PendingSlot {
					kind,
					line: line_number,
					line_start,
					body_start: offset,
				});
			}
			MarkerLine::ManualClose => {
				manual_closes += 1;
				let Some(pending) = manual.pop() else {
					unbalanced = true;
					continue;
				};
				let Some(slot) = close_slot(file, content, pending, &fences, line_number, line_start, line_end) else {
					continue;
				};
				if let SlotKind::Generated { reference } = &slot.kind {
					validate_generated(file, &slot, reference, &mut scan.findings);
				}
				scan.slots.push(slot);
			}
		}
	}

	if let Some(pending) = managed {
		scan.findings.push(unclosed_managed(file, &pending));
	}

	if unbalanced || !manual.is_empty() {
		scan.findings.push(Finding::new(
			FindingKind::UnclosedMarker,
			file,
			None,
			format!(
				"{manual_opens} opening pseudo/invalid/generated marker(s) but {manual_closes} \
				 `<!-- /snippet -->` close(s)"
			),
		));
	}

	scan.slots.sort_by_key(|slot| slot.span.start);
	scan
}

fn classify_marker(text: &str) -> Option<MarkerLine<'_>> {
	if let Some(inner) = text.strip_prefix("<!--").and_then(|rest| rest.strip_suffix("-->")) {
		let inner = inner.trim();
		return match inner {
			"endSnippet" => Some(MarkerLine::ManagedClose),
			"/snippet" => Some(MarkerLine::ManualClose),
			_ => {
				if let Some(id) = inner.strip_prefix("snippet:") {
					Some(MarkerLine::ManagedOpen(id.trim()))
				} else if let Some(id) = inner.strip_prefix("pseudo:") {
					Some(MarkerLine::ManualOpen(ManualKind::Pseudo, id.trim()))
				} else if let Some(id) = inner.strip_prefix("invalid:") {
					Some(MarkerLine::ManualOpen(ManualKind::Invalid, id.trim()))
				} else {
					inner
						.strip_prefix("generated:")
						.map(|reference| MarkerLine::ManualOpen(ManualKind::Generated, reference.trim()))
				}
			}
		};
	}

	let id = text.strip_prefix("snippet:")?.trim();
	is_valid_id(id).then_some(MarkerLine::Reference(id))
}

fn is_valid_id(id: &str) -> bool {
	!id.is_empty() && !id.contains(char::is_whitespace)
}

fn manual_slot_kind(kind: ManualKind, payload: &str) -> Option<SlotKind> {
	match kind {
		ManualKind::Pseudo => is_valid_id(payload).then(|| SlotKind::Pseudo { id: payload.to_string() }),
		ManualKind::Invalid => {
			is_valid_id(payload).then(|| SlotKind::Invalid { id: payload.to_string() })
		}
		ManualKind::Generated => {
			GeneratedRef::parse(payload).map(|reference| SlotKind::Generated { reference })
		}
	}
}

fn close_slot(
	file: &Path,
	content: &str,
	pending: PendingSlot,
	fences: &[SeenFence],
	line: usize,
	line_start: usize,
	line_end: usize,
) -> Option<MarkdownSlot> {
	let kind = pending.kind?;
	let body = pending.body_start..line_start;
	let fence = fences
		.iter()
		.find(|seen| body.contains(&seen.offset))
		.map(|seen| seen.block.clone());

	Some(MarkdownSlot {
		kind,
		file: file.to_path_buf(),
		span: pending.line_start..line_end,
		rendered: Some(content[body.clone()].to_string()),
		body,
		line: pending.line,
		end_line: line,
		fence,
	})
}

fn validate_generated(
	file: &Path,
	slot: &MarkdownSlot,
	reference: &GeneratedRef,
	findings: &mut Vec<Finding>,
) {
	match &slot.fence {
		None => {
			findings.push(malformed(
				file,
				slot.line,
				format!("generated block `{reference}` has no fenced code block"),
			));
		}
		Some(fence) if fence.language.is_none() => {
			findings.push(malformed(
				file,
				fence.line,
				format!("generated block `{reference}` needs a language tag on its code fence"),
			));
		}
		Some(_) => {}
	}
}

fn unclosed_managed(file: &Path, pending: &PendingSlot) -> Finding {
	let id = pending
		.kind
		.as_ref()
		.and_then(SlotKind::id)
		.unwrap_or_default();
	Finding::new(
		FindingKind::UnclosedMarker,
		file,
		Some(pending.line),
		format!("`<!-- snippet: {id} -->` is never closed with `<!-- endSnippet -->`"),
	)
}

fn malformed(file: &Path, line: usize, message: String) -> Finding {
	Finding::new(FindingKind::MalformedMarker, file, Some(line), message)
}
