use std::collections::BTreeSet;
use std::path::Path;

use markdown::ParseOptions;
use markdown::mdast::Code;
use markdown::mdast::Node;
use markdown::to_mdast;

use crate::Finding;
use crate::FindingKind;
use crate::LanguageRegistry;
use crate::MarkdownSlot;
use crate::SnipError;
use crate::SnipResult;

/// Report every fenced block of a guarded language that no marker claims.
///
/// `guarded` holds canonical fence tags. Block tags are resolved through
/// `registry` first so aliases such as `cs` match `csharp`.
pub fn verify_coverage(
	file: &Path,
	content: &str,
	slots: &[MarkdownSlot],
	guarded: &BTreeSet<String>,
	registry: &LanguageRegistry,
) -> SnipResult<Vec<Finding>> {
	if guarded.is_empty() {
		return Ok(Vec::new());
	}

	let claimed: Vec<&MarkdownSlot> = slots.iter().filter(|slot| slot.kind.claims_code()).collect();
	let mut findings = Vec::new();

	for block in get_code_nodes(content)? {
		let Some(lang) = block.lang.as_deref() else {
			continue;
		};
		let Some(language) = registry.canonical_fence(lang) else {
			continue;
		};
		if !guarded.contains(&language) {
			continue;
		}
		let Some(line) = block.position.as_ref().map(|position| position.start.line) else {
			continue;
		};

		if claimed.iter().any(|slot| slot.contains_line(line)) {
			continue;
		}

		findings.push(Finding::new(
			FindingKind::UnmarkedBlock,
			file,
			Some(line),
			format!("`{language}` code block is not marked as a snippet, pseudo, invalid or generated"),
		));
	}

	Ok(findings)
}

/// All fenced code blocks in document order.
pub fn get_code_nodes(content: impl AsRef<str>) -> SnipResult<Vec<Code>> {
	let options = ParseOptions::gfm();
	let mdast =
		to_mdast(content.as_ref(), &options).map_err(|e| SnipError::Markdown(e.to_string()))?;
	let mut code_nodes = vec![];
	collect_code(&mdast, &mut code_nodes);

	Ok(code_nodes)
}

fn collect_code(node: &Node, nodes: &mut Vec<Code>) {
	match node {
		Node::Code(code) => nodes.push(code.clone()),
		_ => {
			if let Some(node) = node.children() {
				for child in node {
					collect_code(child, nodes);
				}
			}
		}
	}
}
