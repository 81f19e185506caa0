use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use crate::Finding;
use crate::FindingDetail;
use crate::FindingKind;
use crate::GeneratedRef;
use crate::MarkdownSlot;
use crate::SlotKind;
use crate::normalize_line_endings;

/// Compare every generated slot against the file lines it references.
///
/// Slots without a fenced block are skipped; the marker scanner already
/// reports them as malformed.
pub fn detect_drift(slots: &[MarkdownSlot], base: &Path) -> Vec<Finding> {
	let mut findings = Vec::new();

	for slot in slots {
		let SlotKind::Generated { reference } = &slot.kind else {
			continue;
		};
		let Some(fence) = &slot.fence else {
			continue;
		};

		let path = resolve_generated_path(base, reference);
		let content = match std::fs::read_to_string(&path) {
			Ok(content) => normalize_line_endings(&content),
			Err(error) if error.kind() == ErrorKind::NotFound => {
				findings.push(Finding::new(
					FindingKind::MissingGeneratedSource,
					&slot.file,
					Some(slot.line),
					format!("generated source `{}` does not exist", reference.path),
				));
				continue;
			}
			Err(error) => {
				findings.push(Finding::new(
					FindingKind::FileError,
					&slot.file,
					Some(slot.line),
					format!("cannot read generated source `{}`: {error}", reference.path),
				));
				continue;
			}
		};

		let expected = trim_blank_lines(&referenced_lines(&content, reference));
		let found = trim_blank_lines(&fence.content);
		if expected != found {
			tracing::debug!(file = %slot.file.display(), line = slot.line, "generated block drifted");
			findings.push(
				Finding::new(
					FindingKind::Drift,
					&slot.file,
					Some(slot.line),
					format!("generated block no longer matches `{reference}`"),
				)
				.with_detail(FindingDetail::Drift { expected, found }),
			);
		}
	}

	findings
}

/// Marker paths are relative to `base`; a leading `/` means the same thing.
pub fn resolve_generated_path(base: &Path, reference: &GeneratedRef) -> PathBuf {
	base.join(reference.path.trim_start_matches('/'))
}

/// Lines `start..=end` (1-indexed), clamped to the file length.
fn referenced_lines(content: &str, reference: &GeneratedRef) -> String {
	content
		.lines()
		.skip(reference.start_line - 1)
		.take(reference.end_line - reference.start_line + 1)
		.collect::<Vec<_>>()
		.join("\n")
}

fn trim_blank_lines(text: &str) -> String {
	let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
	let first = lines.iter().position(|line| !line.is_empty());
	let last = lines.iter().rposition(|line| !line.is_empty());

	match (first, last) {
		(Some(first), Some(last)) => lines[first..=last].join("\n"),
		_ => String::new(),
	}
}
