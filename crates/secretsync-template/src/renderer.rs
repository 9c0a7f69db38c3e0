// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior, Value};
use tracing::{debug, instrument};

use crate::error::{TemplateError, TemplateResult};
use crate::functions;
use crate::output::{self, BoundedSink, MAX_RENDERED_LEN};
use crate::projection::{SecretProjection, TemplateScope, TemplateTarget};
use crate::syntax::Delimiters;

/// Instruction budget for a single template.
pub const TEMPLATE_FUEL: u64 = 100_000;

/// Compiles and executes secret templates.
///
/// Holds the function table and delimiter configuration; immutable once
/// built, so one renderer can be shared across tasks.
pub struct Renderer {
	env: Environment<'static>,
	delimiters: Delimiters,
}

impl Renderer {
	pub fn new(delimiters: Delimiters) -> TemplateResult<Self> {
		let mut env = Environment::empty();
		env.set_syntax(delimiters.syntax_config()?);
		env.set_undefined_behavior(UndefinedBehavior::Strict);
		env.set_keep_trailing_newline(true);
		env.set_auto_escape_callback(|_| AutoEscape::None);
		env.set_formatter(output::format_value);
		env.set_fuel(Some(TEMPLATE_FUEL));
		functions::install(&mut env);
		Ok(Self { env, delimiters })
	}

	pub fn delimiters(&self) -> &Delimiters {
		&self.delimiters
	}

	/// Render `templates` against `data` and write the results into
	/// `projection`.
	///
	/// Entries are processed in key order and the first failure stops
	/// processing. Entries written before the failure remain in
	/// `projection`.
	#[instrument(skip_all, fields(scope = %scope, target = %target))]
	pub fn execute(
		&self,
		templates: Option<&BTreeMap<String, Vec<u8>>>,
		data: &BTreeMap<String, Vec<u8>>,
		scope: TemplateScope,
		target: TemplateTarget,
		projection: &mut SecretProjection,
	) -> TemplateResult<()> {
		let Some(templates) = templates else {
			return Ok(());
		};
		let ctx = data_view(data);

		for (key, template) in templates {
			let rendered = self.render(key, template, &ctx)?;
			match scope {
				TemplateScope::Values => {
					if target != TemplateTarget::Data && std::str::from_utf8(&rendered).is_err() {
						let err = Error::new(
							ErrorKind::InvalidOperation,
							format!("{target} values must be UTF-8 text"),
						);
						return Err(TemplateError::from_render(key, err));
					}
					projection.apply(target, key.as_str(), rendered)
				}
				TemplateScope::KeysAndValues => {
					for (k, v) in decode_pairs(key, &rendered)? {
						projection.apply(target, k, v.into_bytes());
					}
				}
			}
		}

		debug!(count = templates.len(), "rendered templates");
		Ok(())
	}

	/// Render a single template against `data`.
	pub fn render_one(
		&self,
		key: &str,
		template: &str,
		data: &BTreeMap<String, Vec<u8>>,
	) -> TemplateResult<Vec<u8>> {
		self.render(key, template.as_bytes(), &data_view(data))
	}

	/// Render one template to the exact bytes it produces.
	fn render(&self, key: &str, template: &[u8], ctx: &Value) -> TemplateResult<Vec<u8>> {
		let fail = |e: Error| TemplateError::from_render(key, e);
		let source = std::str::from_utf8(template)
			.map_err(|e| Error::new(ErrorKind::SyntaxError, "template is not UTF-8").with_source(e))
			.map_err(fail)?;
		output::ensure_unreserved(source)
			.map_err(|e| Error::new(ErrorKind::SyntaxError, e.to_string()))
			.map_err(fail)?;
		let source = self.delimiters.normalize(source);

		let template = self.env.template_from_named_str(key, &source).map_err(fail)?;
		let mut sink = BoundedSink::new(MAX_RENDERED_LEN);
		template.render_to_write(ctx, &mut sink).map_err(fail)?;
		sink.into_bytes().map_err(fail)
	}
}

/// Render with the default delimiters.
pub fn execute(
	templates: Option<&BTreeMap<String, Vec<u8>>>,
	data: &BTreeMap<String, Vec<u8>>,
	scope: TemplateScope,
	target: TemplateTarget,
	projection: &mut SecretProjection,
) -> TemplateResult<()> {
	Renderer::new(Delimiters::default())?.execute(templates, data, scope, target, projection)
}

/// Expose secret data to templates: UTF-8 values as strings, anything else
/// as bytes.
fn data_view(data: &BTreeMap<String, Vec<u8>>) -> Value {
	let view: BTreeMap<String, Value> = data
		.iter()
		.map(|(k, v)| {
			let value = match std::str::from_utf8(v) {
				Ok(s) => Value::from(s),
				Err(_) => Value::from_bytes(v.clone()),
			};
			(k.clone(), value)
		})
		.collect();
	Value::from(view)
}

fn decode_pairs(key: &str, rendered: &[u8]) -> TemplateResult<BTreeMap<String, String>> {
	if rendered.iter().all(u8::is_ascii_whitespace) {
		return Ok(BTreeMap::new());
	}
	let pairs: Option<BTreeMap<String, String>> =
		serde_yaml::from_slice(rendered).map_err(|source| TemplateError::StructuredDecode {
			key: key.to_string(),
			source,
		})?;
	Ok(pairs.unwrap_or_default())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
			.collect()
	}

	#[test]
	fn keeps_trailing_newline() {
		let renderer = Renderer::new(Delimiters::default()).unwrap();
		let out = renderer
			.render_one("k", "{{ .a }}\n", &data(&[("a", "x")]))
			.unwrap();
		assert_eq!(out, b"x\n");
	}

	#[test]
	fn html_like_keys_are_not_escaped() {
		let renderer = Renderer::new(Delimiters::default()).unwrap();
		let out = renderer
			.render_one("index.html", "{{ .a }}", &data(&[("a", "<b>&</b>")]))
			.unwrap();
		assert_eq!(out, b"<b>&</b>");
	}

	#[test]
	fn binary_values_survive_as_bytes() {
		let renderer = Renderer::new(Delimiters::default()).unwrap();
		let mut input = BTreeMap::new();
		input.insert("blob".to_string(), vec![0xff, 0x00, 0xfe]);
		let out = renderer.render_one("k", "{{ .blob | b64enc }}", &input).unwrap();
		assert_eq!(out, b"/wD+");
	}

	#[test]
	fn raw_bytes_render_unchanged() {
		let renderer = Renderer::new(Delimiters::default()).unwrap();
		let mut input = BTreeMap::new();
		input.insert("blob".to_string(), vec![0x41, 0xff, 0x42]);
		let out = renderer.render_one("k", "<{{ .blob }}>", &input).unwrap();
		assert_eq!(out, b"<A\xffB>");
	}

	#[test]
	fn template_text_may_not_use_the_raw_byte_block() {
		let renderer = Renderer::new(Delimiters::default()).unwrap();
		let err = renderer
			.render_one("k", "x\u{10FF41}", &BTreeMap::new())
			.unwrap_err();
		assert!(matches!(err, TemplateError::Parse { .. }));

		let err = renderer
			.render_one("k", "{{ .a }}", &data(&[("a", "\u{10FF41}")]))
			.unwrap_err();
		assert!(matches!(err, TemplateError::Execute { .. }));
	}

	#[test]
	fn non_utf8_template_is_a_parse_error() {
		let renderer = Renderer::new(Delimiters::default()).unwrap();
		let err = renderer
			.render(
				"k",
				&[b'{', b'{', 0xff, b'}', b'}'],
				&data_view(&BTreeMap::new()),
			)
			.unwrap_err();
		assert!(matches!(err, TemplateError::Parse { ref key, .. } if key == "k"));
	}

	#[test]
	fn output_is_capped() {
		let renderer = Renderer::new(Delimiters::default()).unwrap();
		let big = "a".repeat(MAX_RENDERED_LEN / 2 + 1);
		let err = renderer
			.render_one("k", "{{ .big }}{{ .big }}", &data(&[("big", big.as_str())]))
			.unwrap_err();
		let TemplateError::Execute { source, .. } = &err else {
			panic!("expected an execution error, got {err:?}");
		};
		assert_eq!(source.kind(), ErrorKind::WriteFailure);
	}

	#[test]
	fn runaway_loops_run_out_of_fuel() {
		let renderer = Renderer::new(Delimiters::default()).unwrap();
		let template = "{% for a in .s %}{% for b in .s %}{% for c in .s %}\
		                {% endfor %}{% endfor %}{% endfor %}";
		let s = "x".repeat(100);
		let err = renderer
			.render_one("k", template, &data(&[("s", s.as_str())]))
			.unwrap_err();
		let TemplateError::Execute { source, .. } = &err else {
			panic!("expected an execution error, got {err:?}");
		};
		assert_eq!(source.kind(), ErrorKind::OutOfFuel);
	}

	#[test]
	fn custom_delimiters_leave_default_braces_literal() {
		let renderer = Renderer::new(Delimiters::new("<<", ">>").unwrap()).unwrap();
		let out = renderer
			.render_one("k", "<< .a >> {{ .a }}", &data(&[("a", "x")]))
			.unwrap();
		assert_eq!(out, b"x {{ .a }}");
	}

	#[test]
	fn empty_document_decodes_to_no_pairs() {
		assert!(decode_pairs("k", b"").unwrap().is_empty());
		assert!(decode_pairs("k", b"\n  \n").unwrap().is_empty());
		assert!(decode_pairs("k", b"~").unwrap().is_empty());
	}
}
