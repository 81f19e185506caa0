use std::path::Path;

use crate::LanguageSpec;
use crate::Snippet;

/// A named region found in one source file, before it is tied to a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
	pub id: String,
	pub start_line: usize,
	pub end_line: usize,
	pub content: String,
}

/// A structural problem that invalidates every region in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionError {
	/// 1-indexed line of the offending delimiter.
	pub line: usize,
	pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DelimiterForm {
	/// `#region {id}` … `#endregion`
	Region,
	/// `begin-snippet: {id}` … `end-snippet`
	Snippet,
}

impl DelimiterForm {
	fn closing(self) -> &'static str {
		match self {
			Self::Region => "#endregion",
			Self::Snippet => "end-snippet",
		}
	}
}

#[derive(Debug)]
enum Delimiter<'a> {
	Open {
		form: DelimiterForm,
		name: &'a str,
	},
	Close {
		form: DelimiterForm,
		name: Option<&'a str>,
	},
}

/// An opened region waiting for its closing delimiter.
struct OpenRegion {
	/// `None` for editor-fold regions that produce no snippet.
	id: Option<String>,
	form: DelimiterForm,
	/// 1-indexed line of the opening delimiter.
	line: usize,
}

/// Scan a single source file and tie its regions to `file`.
pub fn scan_source_file(
	file: &Path,
	content: &str,
	language: &LanguageSpec,
	reserved: &[String],
) -> Result<Vec<Snippet>, RegionError> {
	let regions = parse_regions(content, language, reserved)?;

	Ok(regions
		.into_iter()
		.map(|region| {
			Snippet {
				id: region.id,
				file: file.to_path_buf(),
				start_line: region.start_line,
				end_line: region.end_line,
				language: language.fence.clone(),
				content: region.content,
			}
		})
		.collect())
}

/// Extract every named region from `content` (LF line endings).
///
/// Regions may nest; both the outer and the inner span are returned, the
/// outer content keeping the inner delimiter lines verbatim. Regions are
/// ordered by their opening line. Any unterminated or mismatched delimiter
/// fails the whole file.
pub fn parse_regions(
	content: &str,
	language: &LanguageSpec,
	reserved: &[String],
) -> Result<Vec<Region>, RegionError> {
	let lines: Vec<&str> = content.lines().collect();
	let mut stack: Vec<OpenRegion> = Vec::new();
	let mut regions: Vec<(usize, Region)> = Vec::new();

	for (index, line) in lines.iter().enumerate() {
		let line_number = index + 1;
		let Some(delimiter) = classify_line(line, language) else {
			continue;
		};

		match delimiter {
			Delimiter::Open { form, name } => {
				let id = match form {
					DelimiterForm::Region if is_fold_region(name, reserved) => {
						tracing::debug!(line = line_number, name, "skipping editor-fold region");
						None
					}
					DelimiterForm::Snippet if !is_valid_id(name) => {
						return Err(RegionError {
							line: line_number,
							message: format!("`begin-snippet:` needs a single-word id, got `{name}`"),
						});
					}
					_ => Some(name.to_string()),
				};

				stack.push(OpenRegion {
					id,
					form,
					line: line_number,
				});
			}
			Delimiter::Close { form, name } => {
				let Some(open) = stack.pop() else {
					return Err(RegionError {
						line: line_number,
						message: format!("`{}` without an open region", form.closing()),
					});
				};

				if open.form != form {
					return Err(RegionError {
						line: line_number,
						message: format!(
							"`{}` closes the region opened at line {}, which expects `{}`",
							form.closing(),
							open.line,
							open.form.closing()
						),
					});
				}

				if let (Some(name), Some(id)) = (name, open.id.as_deref()) {
					if name != id {
						return Err(RegionError {
							line: line_number,
							message: format!(
								"`#endregion {name}` does not match the innermost open region `{id}` \
								 (line {})",
								open.line
							),
						});
					}
				}

				if let Some(id) = open.id {
					let body = &lines[open.line..index];
					regions.push((open.line, build_region(id, body, open.line, line_number)));
				}
			}
		}
	}

	if let Some(open) = stack.pop() {
		let name = open.id.as_deref().unwrap_or("<fold>");
		return Err(RegionError {
			line: open.line,
			message: format!(
				"region `{name}` is never closed with `{}`",
				open.form.closing()
			),
		});
	}

	regions.sort_by_key(|(line, _)| *line);
	Ok(regions.into_iter().map(|(_, region)| region).collect())
}

fn classify_line<'a>(line: &'a str, language: &LanguageSpec) -> Option<Delimiter<'a>> {
	if let Some(delimiter) = classify_directive(line.trim()) {
		return Some(delimiter);
	}

	let stripped = language.strip_comment(line);
	let stripped = stripped.strip_suffix("-->").map_or(stripped, str::trim_end);
	classify_directive(stripped)
}

fn classify_directive(text: &str) -> Option<Delimiter<'_>> {
	if let Some(rest) = keyword_rest(text, "#endregion") {
		let name = rest.trim();
		return Some(Delimiter::Close {
			form: DelimiterForm::Region,
			name: (!name.is_empty()).then_some(name),
		});
	}

	if let Some(rest) = keyword_rest(text, "#region") {
		return Some(Delimiter::Open {
			form: DelimiterForm::Region,
			name: rest.trim(),
		});
	}

	if let Some(rest) = text.strip_prefix("begin-snippet:") {
		return Some(Delimiter::Open {
			form: DelimiterForm::Snippet,
			name: rest.trim(),
		});
	}

	keyword_rest(text, "end-snippet").map(|_| {
		Delimiter::Close {
			form: DelimiterForm::Snippet,
			name: None,
		}
	})
}

/// The text after `keyword` when it is followed by whitespace or nothing.
fn keyword_rest<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
	let rest = text.strip_prefix(keyword)?;
	(rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

fn is_valid_id(name: &str) -> bool {
	!name.is_empty() && !name.contains(char::is_whitespace)
}

/// Anonymous regions, names with spaces and reserved names are editor folds.
fn is_fold_region(name: &str, reserved: &[String]) -> bool {
	!is_valid_id(name) || reserved.iter().any(|r| r == name)
}

/// Trim surrounding blank lines, dedent, and record the surviving line
/// range. `open_line` and `close_line` are the delimiter lines.
fn build_region(id: String, body: &[&str], open_line: usize, close_line: usize) -> Region {
	let first = body.iter().position(|line| !line.trim().is_empty());
	let last = body.iter().rposition(|line| !line.trim().is_empty());

	let (Some(first), Some(last)) = (first, last) else {
		return Region {
			id,
			start_line: open_line,
			end_line: close_line,
			content: String::new(),
		};
	};

	let kept = &body[first..=last];
	let indent = kept
		.iter()
		.filter(|line| !line.trim().is_empty())
		.map(|line| leading_whitespace(line))
		.min()
		.unwrap_or(0);

	let mut content = String::new();
	for line in kept {
		if line.trim().is_empty() {
			content.push('\n');
		} else {
			content.push_str(&line[indent..]);
			content.push('\n');
		}
	}

	Region {
		id,
		start_line: open_line + 1 + first,
		end_line: open_line + 1 + last,
		content,
	}
}

fn leading_whitespace(line: &str) -> usize {
	line.len() - line.trim_start_matches([' ', '\t']).len()
}
