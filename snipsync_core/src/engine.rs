use std::collections::BTreeSet;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::Document;
use crate::DocumentUpdate;
use crate::Finding;
use crate::FindingKind;
use crate::ProjectContext;
use crate::Report;
use crate::SnipResult;
use crate::SnippetIndex;
use crate::SyncMode;
use crate::coverage::verify_coverage;
use crate::drift::detect_drift;
use crate::marker::parse_markers;
use crate::project::scan_docs;
use crate::project::scan_sources;
use crate::sync::synchronize;
use crate::sync::write_updates;

/// Both trees scanned and the snippet index built, before synchronization.
#[derive(Debug, Clone)]
pub struct ProjectScan {
	pub index: SnippetIndex,
	pub documents: Vec<Document>,
	/// Source, duplicate and unreadable-file findings.
	pub findings: Vec<Finding>,
	pub source_file_count: usize,
}

/// Result of a check or update run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
	pub report: Report,
	/// Documents that changed (or would change, in a dry run). Empty for a
	/// check.
	pub updates: Vec<DocumentUpdate>,
}

/// Scan the source tree, build the snippet index, and load every document.
///
/// The index is only built once every source file has been scanned, so
/// duplicate detection always sees the whole tree.
pub fn scan_project(ctx: &ProjectContext) -> SnipResult<ProjectScan> {
	let sources = scan_sources(ctx)?;
	let (index, duplicates) = SnippetIndex::build(sources.snippets);
	let (documents, doc_findings) = scan_docs(ctx)?;
	tracing::debug!(
		snippets = index.len(),
		documents = documents.len(),
		"project scanned"
	);

	let mut findings = sources.findings;
	findings.extend(duplicates);
	// The two trees can overlap; report each unreadable path once.
	for finding in doc_findings {
		if !findings.contains(&finding) {
			findings.push(finding);
		}
	}

	Ok(ProjectScan {
		index,
		documents,
		findings,
		source_file_count: sources.file_count,
	})
}

/// Run the full pipeline without writing. Managed blocks that differ from
/// their snippet are reported as [`FindingKind::StaleBlock`] errors.
pub fn check_project(ctx: &ProjectContext) -> SnipResult<RunOutcome> {
	let scan = scan_project(ctx)?;
	let sync = synchronize(&scan.index, &scan.documents, ctx.link_root(), SyncMode::Check);

	let mut findings = scan.findings;
	findings.extend(sync.findings);
	let report = verify(ctx, &scan.index, &scan.documents, findings, Vec::new());

	Ok(RunOutcome {
		report,
		updates: Vec::new(),
	})
}

/// Synchronize every managed block, write the changed documents (unless
/// `dry_run`), then verify the synchronized documents.
pub fn update_project(ctx: &ProjectContext, dry_run: bool) -> SnipResult<RunOutcome> {
	let scan = scan_project(ctx)?;
	let sync = synchronize(&scan.index, &scan.documents, ctx.link_root(), SyncMode::Update);

	let mut findings = scan.findings;
	findings.extend(sync.findings);
	if !dry_run {
		findings.extend(write_updates(&sync.updates));
	}

	let documents: Vec<Document> = scan
		.documents
		.into_iter()
		.map(|document| {
			match sync.updates.iter().find(|update| update.path == document.path) {
				Some(update) => {
					Document {
						scan: parse_markers(&document.path, &update.updated),
						content: update.updated.clone(),
						..document
					}
				}
				None => document,
			}
		})
		.collect();

	let updated_files = sync.updates.iter().map(|update| update.path.clone()).collect();
	let report = verify(ctx, &scan.index, &documents, findings, updated_files);

	Ok(RunOutcome {
		report,
		updates: sync.updates,
	})
}

/// Marker, drift and coverage checks over the (synchronized) documents.
fn verify(
	ctx: &ProjectContext,
	index: &SnippetIndex,
	documents: &[Document],
	mut findings: Vec<Finding>,
	updated_files: Vec<PathBuf>,
) -> Report {
	let guarded = guarded_languages(ctx, index);

	let per_document: Vec<Vec<Finding>> = documents
		.par_iter()
		.map(|document| {
			let mut found = document.scan.findings.clone();
			found.extend(detect_drift(&document.scan.slots, &ctx.generated_base));
			match verify_coverage(
				&document.path,
				&document.content,
				&document.scan.slots,
				&guarded,
				&ctx.registry,
			) {
				Ok(coverage) => found.extend(coverage),
				Err(error) => {
					found.push(Finding::new(
						FindingKind::FileError,
						&document.path,
						None,
						error.to_string(),
					));
				}
			}
			found
		})
		.collect();

	findings.extend(per_document.into_iter().flatten());
	let slot_count = documents.iter().map(|document| document.scan.slots.len()).sum();

	Report::new(findings, index.len(), slot_count, updated_files)
}

/// Canonical fence tags whose blocks must be claimed by a marker.
pub fn guarded_languages(ctx: &ProjectContext, index: &SnippetIndex) -> BTreeSet<String> {
	match &ctx.guarded_languages {
		Some(languages) => {
			languages
				.iter()
				.filter_map(|language| ctx.registry.canonical_fence(language))
				.collect()
		}
		None => index.values().map(|snippet| snippet.language.clone()).collect(),
	}
}
