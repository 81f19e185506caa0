//! `snipsync_core` keeps code samples in markdown documentation in sync with a
//! tree of compilable source files, and verifies that every code block in the
//! documentation is accounted for.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source tree
//!   → Source region scanner (`#region id` / `begin-snippet: id`, in parallel)
//!   → Snippet index (barrier, duplicate detection)
//! Documentation tree
//!   → Marker scanner (`snippet:`, `pseudo:`, `invalid:`, `generated:` slots)
//!   → Synchronizer (expands references, refreshes managed blocks)
//!   → Drift detector + coverage verifier
//!   → Report
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `snipsync.toml`: roots, exclude/include patterns, guarded languages, reserved region names and custom languages.
//! - [`project`]: Directory walking and parallel scanning of the source and documentation trees.
//! - [`source_scanner`]: Region extraction from a single source file.
//! - [`marker`]: Slot extraction from a single markdown document.
//!
//! ## Key Types
//!
//! - [`Snippet`]: A named, dedented span of source code.
//! - [`MarkdownSlot`]: A placeholder or expanded block in a markdown document, tagged by [`SlotKind`].
//! - [`ProjectContext`]: The resolved project: roots, language table and options.
//! - [`Report`]: Sorted [`Finding`]s and a pass/fail [`Verdict`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snipsync_core::Overrides;
//! use snipsync_core::ProjectContext;
//! use snipsync_core::update_project;
//! use std::path::Path;
//!
//! let ctx = ProjectContext::load(Path::new("."), &Overrides::default()).unwrap();
//! let outcome = update_project(&ctx, false).unwrap();
//!
//! println!("{}", outcome.report.summary());
//! if !outcome.report.is_pass() {
//!     std::process::exit(1);
//! }
//! ```

pub use config::*;
pub use coverage::*;
pub use drift::*;
pub use engine::*;
pub use error::*;
pub use language::*;
pub use marker::*;
pub use project::*;
pub use report::*;
pub use snippet::*;
pub use source_scanner::*;
pub use sync::*;

pub mod config;
mod coverage;
mod drift;
mod engine;
#[allow(unused_assignments)]
mod error;
pub(crate) mod fence;
mod language;
pub mod marker;
pub mod project;
mod report;
mod snippet;
pub mod source_scanner;
mod sync;

#[cfg(test)]
mod __fixtures;
