// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Subcommand bodies, kept free of argument parsing so they can be tested.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context as _, Result};
use base64::Engine;
use secretsync_generator::{Context, Generated, GeneratorKind, GeneratorRegistry};
use secretsync_kube::ObjectClient;
use secretsync_template::{Renderer, SecretProjection, TemplateScope, TemplateTarget};
use serde::Serialize;
use tracing::{debug, info};

/// Read a YAML map of string keys to string values.
pub fn read_string_map(path: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read {}", path.display()))?;
	if content.trim().is_empty() {
		return Ok(BTreeMap::new());
	}
	let map: BTreeMap<String, String> = serde_yaml::from_str(&content)
		.with_context(|| format!("{} is not a YAML map of strings", path.display()))?;
	Ok(map
		.into_iter()
		.map(|(k, v)| (k, v.into_bytes()))
		.collect())
}

/// Render `templates_path` against `data_path` into a fresh projection.
pub fn render(
	renderer: &Renderer,
	templates_path: &Path,
	data_path: &Path,
	scope: TemplateScope,
	target: TemplateTarget,
) -> Result<SecretProjection> {
	let templates = read_string_map(templates_path)?;
	let data = read_string_map(data_path)?;

	let mut projection = SecretProjection::new();
	renderer
		.execute(Some(&templates), &data, scope, target, &mut projection)
		.context("template rendering failed")?;
	debug!(templates = templates.len(), "render complete");
	Ok(projection)
}

/// Run one generator and return its output.
pub async fn generate(
	registry: &GeneratorRegistry,
	kind: GeneratorKind,
	ctx: &Context,
	spec_path: &Path,
	client: &dyn ObjectClient,
	namespace: &str,
) -> Result<Generated> {
	let spec = std::fs::read(spec_path)
		.with_context(|| format!("failed to read spec {}", spec_path.display()))?;
	let generated = registry
		.generate(kind, ctx, Some(spec.as_slice()), client, namespace)
		.await
		.with_context(|| format!("{kind} generator failed"))?;
	info!(%kind, fields = generated.fields.len(), "generated credentials");
	Ok(generated)
}

/// Show bytes as text when they are UTF-8, otherwise as standard base64.
fn printable(value: &[u8]) -> String {
	match std::str::from_utf8(value) {
		Ok(s) => s.to_string(),
		Err(_) => base64::engine::general_purpose::STANDARD.encode(value),
	}
}

pub fn fields_yaml(fields: &BTreeMap<String, Vec<u8>>) -> Result<String> {
	let view: BTreeMap<&str, String> = fields
		.iter()
		.map(|(k, v)| (k.as_str(), printable(v)))
		.collect();
	Ok(serde_yaml::to_string(&view)?)
}

#[derive(Serialize)]
struct ProjectionView<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	data: Option<BTreeMap<&'a str, String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	annotations: Option<&'a BTreeMap<String, String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	labels: Option<&'a BTreeMap<String, String>>,
}

pub fn projection_yaml(projection: &SecretProjection) -> Result<String> {
	let view = ProjectionView {
		data: projection
			.data
			.as_ref()
			.map(|d| d.iter().map(|(k, v)| (k.as_str(), printable(v))).collect()),
		annotations: projection.annotations.as_ref(),
		labels: projection.labels.as_ref(),
	};
	Ok(serde_yaml::to_string(&view)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use secretsync_generator::GithubGeneratorConfig;
	use secretsync_kube::InMemoryObjectClient;
	use secretsync_template::Delimiters;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn yaml_file(content: &str) -> NamedTempFile {
		let mut file = NamedTempFile::new().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[test]
	fn render_values_into_labels() {
		let templates = yaml_file("team: \"{{ .owner | upper }}\"\n");
		let data = yaml_file("owner: infra\n");
		let renderer = Renderer::new(Delimiters::default()).unwrap();

		let projection = render(
			&renderer,
			templates.path(),
			data.path(),
			TemplateScope::Values,
			TemplateTarget::Labels,
		)
		.unwrap();

		assert!(projection.data.is_none());
		assert_eq!(
			projection.labels.as_ref().and_then(|l| l.get("team")).map(String::as_str),
			Some("INFRA")
		);
		assert_eq!(projection_yaml(&projection).unwrap(), "labels:\n  team: INFRA\n");
	}

	#[test]
	fn render_reports_missing_file() {
		let renderer = Renderer::new(Delimiters::default()).unwrap();
		let data = yaml_file("{}\n");
		let err = render(
			&renderer,
			Path::new("/nonexistent/templates.yaml"),
			data.path(),
			TemplateScope::Values,
			TemplateTarget::Data,
		)
		.unwrap_err();
		assert!(err.to_string().contains("failed to read"));
	}

	#[test]
	fn empty_yaml_file_is_an_empty_map() {
		let file = yaml_file("");
		assert!(read_string_map(file.path()).unwrap().is_empty());
	}

	#[test]
	fn binary_fields_print_as_base64() {
		let fields = BTreeMap::from([
			("token".to_string(), b"ghs_abc".to_vec()),
			("der".to_string(), vec![0xff, 0x00]),
		]);
		let printed: BTreeMap<String, String> =
			serde_yaml::from_str(&fields_yaml(&fields).unwrap()).unwrap();
		assert_eq!(printed["der"], "/wA=");
		assert_eq!(printed["token"], "ghs_abc");
	}

	#[tokio::test]
	async fn generate_reports_missing_spec_file() {
		let registry = GeneratorRegistry::with_defaults(GithubGeneratorConfig::default()).unwrap();
		let err = generate(
			&registry,
			GeneratorKind::GithubAccessToken,
			&Context::new(),
			Path::new("/nonexistent/spec.yaml"),
			&InMemoryObjectClient::new(),
			"default",
		)
		.await
		.unwrap_err();
		assert!(err.to_string().contains("failed to read spec"));
	}

	#[tokio::test]
	async fn generate_surfaces_unsupported_kinds() {
		let registry = GeneratorRegistry::with_defaults(GithubGeneratorConfig::default()).unwrap();
		let spec = yaml_file("length: 12\n");
		let err = generate(
			&registry,
			GeneratorKind::Password,
			&Context::new(),
			spec.path(),
			&InMemoryObjectClient::new(),
			"default",
		)
		.await
		.unwrap_err();
		assert!(format!("{err:#}").contains("unsupported generator kind"));
	}
}
