use miette::Diagnostic;
use thiserror::Error;

/// Errors that abort a run. Problems scoped to a single file never surface
/// here; they are recorded as [`Finding`](crate::Finding)s instead.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SnipError {
	#[error(transparent)]
	#[diagnostic(code(snipsync::io_error))]
	Io(#[from] std::io::Error),

	#[error("failure to load markdown: {0}")]
	#[diagnostic(code(snipsync::markdown))]
	Markdown(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(snipsync::config_parse),
		help(
			"check that snipsync.toml is valid TOML with optional [exclude], [include], \
			 [coverage], [regions] and [languages] sections"
		)
	)]
	ConfigParse(String),

	#[error("project root `{path}` is not a readable directory")]
	#[diagnostic(
		code(snipsync::project_not_found),
		help("pass an existing directory with `--path` or run from inside the project")
	)]
	ProjectNotFound { path: String },

	#[error("{role} root `{path}` is not a readable directory")]
	#[diagnostic(
		code(snipsync::root_not_found),
		help("pass an existing directory with `--{role}` or set `{role}` in snipsync.toml")
	)]
	RootNotFound { role: &'static str, path: String },
}

pub type SnipResult<T> = Result<T, SnipError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
