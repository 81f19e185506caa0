//! Line-level fenced code block detection shared by the marker scanner and
//! the synchronizer.

/// An opening code fence: three or more backticks or tildes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceOpen {
	pub fence_char: char,
	pub fence_len: usize,
	/// Everything after the fence characters, trimmed.
	pub info: String,
}

impl FenceOpen {
	/// Parse an opening fence from a single line (without its newline).
	pub fn parse(line: &str) -> Option<Self> {
		let stripped = line.trim_start();
		let backtick_len = stripped.chars().take_while(|&c| c == '`').count();
		let tilde_len = stripped.chars().take_while(|&c| c == '~').count();

		let (fence_char, fence_len) = if backtick_len >= 3 {
			('`', backtick_len)
		} else if tilde_len >= 3 {
			('~', tilde_len)
		} else {
			return None;
		};

		let info = stripped[fence_len..].trim();
		// A backtick fence's info string cannot itself contain backticks.
		if fence_char == '`' && info.contains('`') {
			return None;
		}

		Some(Self {
			fence_char,
			fence_len,
			info: info.to_string(),
		})
	}

	/// Whether `line` closes this fence: same character, at least the same
	/// length, nothing else on the line.
	pub fn is_closed_by(&self, line: &str) -> bool {
		let stripped = line.trim_start();
		let closing_len = stripped.chars().take_while(|&c| c == self.fence_char).count();
		closing_len >= self.fence_len && stripped[closing_len..].trim().is_empty()
	}

	/// The first word of the info string, if any.
	pub fn language(&self) -> Option<&str> {
		self.info
			.split(|c: char| c.is_whitespace() || c == '{')
			.next()
			.filter(|tag| !tag.is_empty())
	}
}

/// A backtick fence long enough to wrap `content` without being closed by a
/// backtick run inside it.
pub fn fence_for(content: &str) -> String {
	let longest = content
		.lines()
		.map(|line| line.trim_start().chars().take_while(|&c| c == '`').count())
		.max()
		.unwrap_or(0);
	"`".repeat(longest.max(2) + 1)
}
