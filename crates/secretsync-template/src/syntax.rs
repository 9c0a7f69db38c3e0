// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Delimiter configuration and source normalisation.
//!
//! Templates use minijinja with configurable variable delimiters:
//! - Variable delimiters: `{{...}}` by default
//! - Block delimiters: `{%...%}`
//! - Comment delimiters: `{#...#}`
//!
//! Go-style leading-dot references (`{{ .user }}`, `{{ .user | upper }}`) are
//! accepted and rewritten to plain identifiers before compilation.

use minijinja::syntax::SyntaxConfig;

use crate::error::{TemplateError, TemplateResult};

pub const DEFAULT_LEFT_DELIMITER: &str = "{{";
pub const DEFAULT_RIGHT_DELIMITER: &str = "}}";

const BLOCK_START: &str = "{%";
const BLOCK_END: &str = "%}";
const COMMENT_START: &str = "{#";
const COMMENT_END: &str = "#}";

/// Variable delimiters for template expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
	left: String,
	right: String,
}

impl Default for Delimiters {
	fn default() -> Self {
		Self {
			left: DEFAULT_LEFT_DELIMITER.to_string(),
			right: DEFAULT_RIGHT_DELIMITER.to_string(),
		}
	}
}

impl Delimiters {
	pub fn new(left: impl Into<String>, right: impl Into<String>) -> TemplateResult<Self> {
		let left = left.into();
		let right = right.into();
		if left.is_empty() || right.is_empty() {
			return Err(TemplateError::Delimiters(
				"left and right delimiters must not be empty".to_string(),
			));
		}
		if left == right {
			return Err(TemplateError::Delimiters(format!(
				"left and right delimiters must differ, both are '{left}'"
			)));
		}
		if [BLOCK_START, COMMENT_START].contains(&left.as_str()) {
			return Err(TemplateError::Delimiters(format!(
				"'{left}' is reserved for blocks and comments"
			)));
		}
		Ok(Self { left, right })
	}

	pub fn left(&self) -> &str {
		&self.left
	}

	pub fn right(&self) -> &str {
		&self.right
	}

	pub(crate) fn syntax_config(&self) -> TemplateResult<SyntaxConfig> {
		SyntaxConfig::builder()
			.variable_delimiters(self.left.clone(), self.right.clone())
			.block_delimiters(BLOCK_START, BLOCK_END)
			.comment_delimiters(COMMENT_START, COMMENT_END)
			.build()
			.map_err(|e| TemplateError::Delimiters(e.to_string()))
	}

	/// Rewrite leading-dot references inside variable and block regions.
	///
	/// Text outside delimiters is left untouched, as is anything in quotes.
	pub fn normalize(&self, template: &str) -> String {
		let mut result = String::with_capacity(template.len());
		let mut remaining = template;

		loop {
			let next = [
				(self.left.as_str(), self.right.as_str()),
				(BLOCK_START, BLOCK_END),
			]
			.into_iter()
			.filter_map(|(open, close)| remaining.find(open).map(|at| (at, open, close)))
			.min_by_key(|(at, _, _)| *at);

			let Some((start, open, close)) = next else {
				break;
			};
			result.push_str(&remaining[..start + open.len()]);
			remaining = &remaining[start + open.len()..];

			match find_close(remaining, close) {
				Some(end) => {
					result.push_str(&strip_leading_dots(&remaining[..end]));
					result.push_str(close);
					remaining = &remaining[end + close.len()..];
				}
				None => break,
			}
		}

		result.push_str(remaining);
		result
	}
}

/// Byte offset of `close` in `expr`, ignoring occurrences inside quotes.
fn find_close(expr: &str, close: &str) -> Option<usize> {
	let mut quote: Option<char> = None;
	let mut escaped = false;
	for (i, ch) in expr.char_indices() {
		match quote {
			Some(_) if escaped => escaped = false,
			Some(_) if ch == '\\' => escaped = true,
			Some(q) if ch == q => quote = None,
			Some(_) => {}
			None if ch == '\'' || ch == '"' => quote = Some(ch),
			None if expr[i..].starts_with(close) => return Some(i),
			None => {}
		}
	}
	None
}

fn dot_may_lead(prev: Option<char>) -> bool {
	match prev {
		None => true,
		Some(c) => {
			c.is_whitespace()
				|| matches!(c, '(' | ',' | '|' | '[' | '-' | '=' | '~' | ':' | '+')
		}
	}
}

fn strip_leading_dots(expr: &str) -> String {
	let mut result = String::with_capacity(expr.len());
	let mut chars = expr.chars().peekable();
	let mut quote: Option<char> = None;
	let mut escaped = false;

	while let Some(ch) = chars.next() {
		match quote {
			Some(_) if escaped => escaped = false,
			Some(_) if ch == '\\' => escaped = true,
			Some(q) if ch == q => quote = None,
			Some(_) => {}
			None if ch == '\'' || ch == '"' => quote = Some(ch),
			None if ch == '.' => {
				let next_is_ident = chars
					.peek()
					.is_some_and(|c| c.is_alphabetic() || *c == '_');
				if next_is_ident && dot_may_lead(result.chars().last()) {
					continue;
				}
			}
			None => {}
		}
		result.push(ch);
	}

	result
}

#[cfg(test)]
mod tests {
	use super::*;

	fn normalize(s: &str) -> String {
		Delimiters::default().normalize(s)
	}

	#[test]
	fn strips_leading_dot_references() {
		assert_eq!(normalize("hello {{.user}}"), "hello {{user}}");
		assert_eq!(normalize("{{ .user | upper }}"), "{{ user | upper }}");
		assert_eq!(normalize("{{- .a -}}"), "{{- a -}}");
		assert_eq!(normalize("{{ pkcs12key(.cert) }}"), "{{ pkcs12key(cert) }}");
	}

	#[test]
	fn keeps_attribute_access_and_numbers() {
		assert_eq!(normalize("{{ user.name }}"), "{{ user.name }}");
		assert_eq!(normalize("{{ 1.5 }}"), "{{ 1.5 }}");
		assert_eq!(normalize("{{ .a.b }}"), "{{ a.b }}");
	}

	#[test]
	fn leaves_quoted_text_alone() {
		assert_eq!(
			normalize(r#"{{ .x | default(" .y") }}"#),
			r#"{{ x | default(" .y") }}"#
		);
		assert_eq!(normalize(r#"{{ "}}" ~ .x }}"#), r#"{{ "}}" ~ x }}"#);
	}

	#[test]
	fn leaves_plain_text_alone() {
		assert_eq!(normalize("a .b c"), "a .b c");
		assert_eq!(normalize("unterminated {{ .x"), "unterminated {{ .x");
	}

	#[test]
	fn normalizes_block_regions() {
		assert_eq!(
			normalize("{% for k in .items %}{{ k }}{% endfor %}"),
			"{% for k in items %}{{ k }}{% endfor %}"
		);
	}

	#[test]
	fn custom_delimiters() {
		let d = Delimiters::new("<<", ">>").unwrap();
		assert_eq!(d.normalize("<< .a >> {{ .b }}"), "<< a >> {{ .b }}");
		assert!(d.syntax_config().is_ok());
	}

	#[test]
	fn rejects_invalid_delimiters() {
		assert!(matches!(
			Delimiters::new("", "}}"),
			Err(TemplateError::Delimiters(_))
		));
		assert!(matches!(
			Delimiters::new("%%", "%%"),
			Err(TemplateError::Delimiters(_))
		));
		assert!(matches!(
			Delimiters::new("{%", "%}"),
			Err(TemplateError::Delimiters(_))
		));
	}
}
