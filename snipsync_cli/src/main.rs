use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use snipsync_cli::Commands;
use snipsync_cli::OutputFormat;
use snipsync_cli::SnipCli;
use snipsync_core::CONFIG_FILE_CANDIDATES;
use snipsync_core::DocumentUpdate;
use snipsync_core::Finding;
use snipsync_core::FindingDetail;
use snipsync_core::Overrides;
use snipsync_core::ProjectContext;
use snipsync_core::Report;
use snipsync_core::SlotKind;
use snipsync_core::SnipConfig;
use snipsync_core::check_project;
use snipsync_core::scan_project;
use snipsync_core::update_project;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

const SAMPLE_CONFIG: &str = r#"# snipsync configuration

# Source tree containing `#region {id}` / `begin-snippet: {id}` regions.
# source = "samples"

# Documentation tree containing markdown files.
# docs = "docs"

# Base directory for `<!-- generated:path#L1-L5 -->` markers.
# generated_base = "."

# Emit a `snippet source` link under every rendered snippet.
# link_source = true

# [exclude]
# patterns = ["bin/", "obj/"]

# Fence languages whose code blocks must always be marked.
# Defaults to the languages of the scanned snippets.
# [coverage]
# languages = ["csharp"]

# Region names treated as editor folds rather than snippets.
# [regions]
# reserved = ["Properties", "Methods", "Fields", "Constructors", "Events"]

# [languages.fsx]
# fence = "fsharp"
# comments = ["//"]
"#;

fn main() {
	let args = SnipCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Check { diff, format }) => run_check(&args, *diff, *format),
		Some(Commands::Update {
			dry_run,
			diff,
			format,
		}) => run_update(&args, *dry_run, *diff, *format),
		Some(Commands::List) => run_list(&args),
		None => {
			eprintln!("No subcommand specified. Run `snipsync --help` for usage.");
			process::exit(2);
		}
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			// Try to render through miette for rich diagnostics with help text
			// and error codes.
			match e.downcast::<snipsync_core::SnipError>() {
				Ok(snip_err) => {
					let report: miette::Report = (*snip_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Log to stderr, filtered by `SNIPSYNC_LOG` (default `warn`, or `debug`
/// with `--verbose`).
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_env("SNIPSYNC_LOG")
		.unwrap_or_else(|_| EnvFilter::new(default_level));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init();
}

type CommandResult = Result<bool, Box<dyn std::error::Error>>;

fn resolve_root(args: &SnipCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_context(args: &SnipCli) -> Result<ProjectContext, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let overrides = Overrides {
		source: args.source.clone(),
		docs: args.docs.clone(),
		link_source: args.no_links.then_some(false),
	};
	let ctx = ProjectContext::load(&root, &overrides)?;
	tracing::debug!(
		source = %ctx.source_root.display(),
		docs = %ctx.docs_root.display(),
		"resolved project"
	);

	Ok(ctx)
}

fn run_init(args: &SnipCli) -> CommandResult {
	let root = resolve_root(args);

	if let Some(existing) = SnipConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(true);
	}

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created {}", config_path.display());
	println!();
	println!("Next steps:");
	println!("  1. Wrap code in your source tree with `#region my-id` … `#endregion`");
	println!("  2. Reference it from markdown with a line containing `snippet: my-id`");
	println!("  3. Run `snipsync update` to expand the reference");

	Ok(true)
}

fn run_check(args: &SnipCli, show_diff: bool, format: OutputFormat) -> CommandResult {
	let ctx = load_context(args)?;
	let outcome = check_project(&ctx)?;

	print_report(&outcome.report, &ctx.root, format, show_diff)?;
	Ok(outcome.report.is_pass())
}

fn run_update(args: &SnipCli, dry_run: bool, show_diff: bool, format: OutputFormat) -> CommandResult {
	let ctx = load_context(args)?;
	let outcome = update_project(&ctx, dry_run)?;

	if format == OutputFormat::Text {
		print_updates(&outcome.updates, &ctx.root, dry_run, args.verbose);
	}
	if show_diff {
		for update in &outcome.updates {
			eprintln!("{}", colored!(make_relative(&update.path, &ctx.root), bold));
			print_diff(&update.original, &update.updated);
		}
	}

	print_report(&outcome.report, &ctx.root, format, false)?;
	Ok(outcome.report.is_pass())
}

fn print_updates(updates: &[DocumentUpdate], root: &Path, dry_run: bool, verbose: bool) {
	if updates.is_empty() {
		println!("All managed blocks are already up to date.");
		return;
	}

	if dry_run {
		println!("Dry run: would update {} file(s):", updates.len());
	} else {
		println!("Updated {} file(s).", updates.len());
	}

	if dry_run || verbose {
		for update in updates {
			println!("  {}", make_relative(&update.path, root));
		}
	}
}

fn print_report(
	report: &Report,
	root: &Path,
	format: OutputFormat,
	show_diff: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	match format {
		OutputFormat::Json => {
			println!("{}", report.relative_to(root).to_json()?);
		}
		OutputFormat::Github => {
			for finding in &report.findings {
				let level = if finding.is_error() { "error" } else { "warning" };
				let rel = make_relative(&finding.file, root);
				let location = match finding.line {
					Some(line) => format!("file={rel},line={line}"),
					None => format!("file={rel}"),
				};
				println!("::{level} {location}::{}", finding.message);
			}
			eprintln!("{}", report.summary());
		}
		OutputFormat::Text => {
			for finding in &report.findings {
				print_finding(finding, root, show_diff);
			}

			if !report.findings.is_empty() {
				eprintln!();
			}

			if report.is_pass() {
				println!(
					"{} {} snippet(s), {} slot(s).",
					colored!("Check passed:", green),
					report.snippet_count,
					report.slot_count
				);
				if report.warning_count() > 0 {
					println!("{}", report.summary());
				}
			} else {
				eprintln!("{}", colored!("Check failed.", red));
				eprintln!("{}", report.summary());
			}
		}
	}

	Ok(())
}

fn print_finding(finding: &Finding, root: &Path, show_diff: bool) {
	let rel = make_relative(&finding.file, root);
	let location = match finding.line {
		Some(line) => format!("{rel}:{line}"),
		None => rel,
	};
	let label = if finding.is_error() {
		colored!("error", red)
	} else {
		colored!("warning", yellow)
	};

	eprintln!("{label}[{}] {location}: {}", finding.kind.code(), finding.message);
	eprintln!("  help: {}", finding.kind.help());

	if !show_diff {
		return;
	}

	match &finding.detail {
		Some(FindingDetail::Stale { current, expected }) => print_diff(current, expected),
		Some(FindingDetail::Drift { expected, found }) => print_diff(found, expected),
		_ => {}
	}
}

fn run_list(args: &SnipCli) -> CommandResult {
	let ctx = load_context(args)?;
	let scan = scan_project(&ctx)?;
	let root = &ctx.root;

	let mut references: BTreeMap<&str, usize> = BTreeMap::new();
	let slots: Vec<_> = scan
		.documents
		.iter()
		.flat_map(|document| document.scan.slots.iter())
		.collect();
	for id in slots
		.iter()
		.filter(|slot| slot.kind.is_managed())
		.filter_map(|slot| slot.kind.id())
	{
		*references.entry(id).or_insert(0) += 1;
	}

	if scan.index.is_empty() && slots.is_empty() {
		println!("No snippets or slots found.");
		return Ok(true);
	}

	if !scan.index.is_empty() {
		println!("{}", colored!("Snippets:", bold));
		for (id, snippet) in scan.index.iter() {
			let rel = make_relative(&snippet.file, root);
			let count = references.get(id.as_str()).copied().unwrap_or(0);
			let status = if count == 0 {
				colored!("orphan", yellow)
			} else {
				format!("{count} reference(s)")
			};
			println!(
				"  {id} [{}] {rel}:{}-{} ({status})",
				snippet.language, snippet.start_line, snippet.end_line
			);
		}
	}

	if !slots.is_empty() {
		if !scan.index.is_empty() {
			println!();
		}
		println!("{}", colored!("Slots:", bold));
		for slot in &slots {
			let rel = make_relative(&slot.file, root);
			let target = match &slot.kind {
				SlotKind::Generated { reference } => reference.to_string(),
				kind => kind.id().unwrap_or_default().to_string(),
			};
			let status = match slot.kind.id() {
				Some(id) if slot.kind.is_managed() && !scan.index.contains_key(id) => {
					format!(" {}", colored!("[missing]", red))
				}
				_ => String::new(),
			};
			println!("  {} {target} {rel}:{}{status}", slot.kind.label(), slot.line);
		}
	}

	println!(
		"\n{} snippet(s), {} slot(s)",
		scan.index.len(),
		slots.len()
	);

	Ok(true)
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
		if change.missing_newline() {
			eprintln!();
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
