use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Keep code samples in markdown compiled, current, and accounted for.",
	long_about = "snipsync extracts named regions from a tree of compilable source files and \
	              injects them into markdown documentation.\n\nEvery fenced code block in the \
	              documentation must be classified: a managed snippet, pseudo code, intentionally \
	              invalid code, or generated output copied from a file.\n\nQuick start:\n  \
	              snipsync init    Create a snipsync.toml\n  snipsync update  Expand and \
	              refresh snippet blocks\n  snipsync check   Verify everything is up to date\n  \
	              snipsync list    Show snippets and where they are used"
)]
pub struct SnipCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Source tree containing snippet regions, relative to the project root.
	/// Overrides `source` in snipsync.toml.
	#[arg(long, global = true)]
	pub source: Option<PathBuf>,

	/// Documentation tree containing markdown files, relative to the project
	/// root. Overrides `docs` in snipsync.toml.
	#[arg(long, global = true)]
	pub docs: Option<PathBuf>,

	/// Do not emit `snippet source` links under rendered snippets.
	#[arg(long, global = true, default_value_t = false)]
	pub no_links: bool,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize snipsync in a project by creating a sample `snipsync.toml`.
	///
	/// If a config file already exists, this command is a no-op and exits
	/// successfully.
	Init,
	/// Check that the documentation is synchronized and fully classified.
	///
	/// Runs the whole pipeline without writing: managed blocks that differ
	/// from their snippet, missing snippets, unbalanced markers, unmarked
	/// code blocks and duplicate ids are errors. Orphan snippets and drifted
	/// generated blocks are warnings. Exits with status 1 when any error is
	/// found.
	Check {
		/// Show a unified diff for each stale managed block and drifted
		/// generated block.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Output format. Use `text` for human-readable output, `json` for
		/// programmatic consumption, or `github` for GitHub Actions
		/// annotations that appear inline on PRs.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Expand snippet references and refresh managed blocks.
	///
	/// Replaces every `snippet: {id}` line with a managed block and rewrites
	/// managed blocks whose content no longer matches the source region,
	/// then verifies the result. Use `--dry-run` to preview changes without
	/// writing to disk.
	Update {
		/// Preview changes without writing files.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Show a unified diff for each file that changes.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Output format for the verification report.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List every snippet with its reference count, and every marker slot.
	List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption: the full report with
	/// paths relative to the project root.
	Json,
	/// GitHub Actions annotation format. Emits `::error` or `::warning`
	/// annotations that appear inline on pull request diffs.
	Github,
}
