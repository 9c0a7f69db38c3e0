// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use proptest::prelude::*;
use secretsync_template::{
	execute, Delimiters, Renderer, SecretProjection, TemplateError, TemplateScope, TemplateTarget,
};

fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
	pairs
		.iter()
		.map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
		.collect()
}

#[test]
fn no_templates_leaves_projection_untouched() {
	let mut projection = SecretProjection::new();
	projection.apply(TemplateTarget::Labels, "keep", b"me".to_vec());
	let before = projection.clone();

	execute(
		None,
		&map(&[("user", "alice")]),
		TemplateScope::Values,
		TemplateTarget::Data,
		&mut projection,
	)
	.unwrap();
	assert_eq!(projection, before);
}

#[test]
fn values_scope_renders_each_entry() {
	let mut projection = SecretProjection::new();
	execute(
		Some(&map(&[("greeting", "hello {{.user}}"), ("shout", "{{ .user | upper }}")])),
		&map(&[("user", "alice")]),
		TemplateScope::Values,
		TemplateTarget::Data,
		&mut projection,
	)
	.unwrap();

	let data = projection.data.unwrap();
	assert_eq!(data["greeting"], b"hello alice");
	assert_eq!(data["shout"], b"ALICE");
	assert!(projection.annotations.is_none());
	assert!(projection.labels.is_none());
}

#[test]
fn keys_and_values_scope_writes_decoded_pairs() {
	let mut projection = SecretProjection::new();
	execute(
		Some(&map(&[("doc", "foo: {{ .a }}\nbaz: qux")])),
		&map(&[("a", "bar")]),
		TemplateScope::KeysAndValues,
		TemplateTarget::Annotations,
		&mut projection,
	)
	.unwrap();

	let annotations = projection.annotations.unwrap();
	assert_eq!(annotations.len(), 2);
	assert_eq!(annotations["foo"], "bar");
	assert_eq!(annotations["baz"], "qux");
	assert!(projection.data.is_none());
}

#[test]
fn keys_and_values_rejects_non_map_output() {
	let mut projection = SecretProjection::new();
	let err = execute(
		Some(&map(&[("doc", "- a\n- b")])),
		&BTreeMap::new(),
		TemplateScope::KeysAndValues,
		TemplateTarget::Labels,
		&mut projection,
	)
	.unwrap_err();
	assert!(matches!(err, TemplateError::StructuredDecode { ref key, .. } if key == "doc"));
	assert!(projection.labels.is_none());
}

#[test]
fn unknown_scope_and_target_are_rejected() {
	assert!(matches!(
		"Everything".parse::<TemplateScope>(),
		Err(TemplateError::UnknownScope(_))
	));
	assert!(matches!(
		"Finalizers".parse::<TemplateTarget>(),
		Err(TemplateError::UnknownTarget(_))
	));
}

#[test]
fn missing_key_stops_processing_but_keeps_earlier_entries() {
	let mut projection = SecretProjection::new();
	let err = execute(
		Some(&map(&[
			("a", "{{ .present }}"),
			("b", "{{ .absent }}"),
			("c", "{{ .present }}"),
		])),
		&map(&[("present", "yes")]),
		TemplateScope::Values,
		TemplateTarget::Data,
		&mut projection,
	)
	.unwrap_err();

	assert!(matches!(err, TemplateError::Execute { ref key, .. } if key == "b"));
	let data = projection.data.unwrap();
	assert_eq!(data["a"], b"yes");
	assert!(!data.contains_key("b"));
	assert!(!data.contains_key("c"));
}

#[test]
fn syntax_errors_are_parse_errors() {
	let mut projection = SecretProjection::new();
	let err = execute(
		Some(&map(&[("broken", "{{ .a ")])),
		&map(&[("a", "x")]),
		TemplateScope::Values,
		TemplateTarget::Data,
		&mut projection,
	)
	.unwrap_err();
	assert!(matches!(err, TemplateError::Parse { ref key, .. } if key == "broken"));
}

#[test]
fn binary_values_reach_data_unchanged() {
	let mut data = BTreeMap::new();
	data.insert("blob".to_string(), vec![0x41, 0xff, 0x42]);
	let mut projection = SecretProjection::new();
	execute(
		Some(&map(&[("k", "{{ .blob }}")])),
		&data,
		TemplateScope::Values,
		TemplateTarget::Data,
		&mut projection,
	)
	.unwrap();
	assert_eq!(projection.data.unwrap()["k"], vec![0x41, 0xff, 0x42]);
}

#[test]
fn binary_output_is_not_a_string_map() {
	let mut data = BTreeMap::new();
	data.insert("blob".to_string(), vec![0xff, 0xfe]);
	let mut projection = SecretProjection::new();
	let err = execute(
		Some(&map(&[("doc", "key: {{ .blob }}")])),
		&data,
		TemplateScope::KeysAndValues,
		TemplateTarget::Labels,
		&mut projection,
	)
	.unwrap_err();
	assert!(matches!(err, TemplateError::StructuredDecode { ref key, .. } if key == "doc"));
}

#[test]
fn binary_output_is_refused_for_string_targets() {
	let mut data = BTreeMap::new();
	data.insert("blob".to_string(), vec![0x41, 0xff]);
	for target in [TemplateTarget::Annotations, TemplateTarget::Labels] {
		let mut projection = SecretProjection::new();
		let err = execute(
			Some(&map(&[("k", "{{ .blob }}")])),
			&data,
			TemplateScope::Values,
			target,
			&mut projection,
		)
		.unwrap_err();
		assert!(matches!(err, TemplateError::Execute { ref key, .. } if key == "k"));
		assert_eq!(projection, SecretProjection::new());
	}
}

#[test]
fn oversized_values_fail_instead_of_exhausting_memory() {
	for template in [
		"{{ 'ab' | repeat(9223372036854775807) }}",
		"{{ repeat(4611686018427387904, 'abcd') }}",
		"{{ .a | indent(9223372036854775807) }}",
		"{{ .a | nindent(2000000) }}",
	] {
		let mut projection = SecretProjection::new();
		let err = execute(
			Some(&map(&[("k", template)])),
			&map(&[("a", "x")]),
			TemplateScope::Values,
			TemplateTarget::Data,
			&mut projection,
		)
		.unwrap_err();
		assert!(
			matches!(err, TemplateError::Execute { ref key, .. } if key == "k"),
			"{template}: {err:?}"
		);
		assert!(projection.data.is_none());
	}
}

#[test]
fn environment_functions_are_unavailable() {
	let renderer = Renderer::new(Delimiters::default()).unwrap();
	let err = renderer
		.render_one("k", "{{ env(\"HOME\") }}", &BTreeMap::new())
		.unwrap_err();
	assert!(matches!(err, TemplateError::Execute { .. } | TemplateError::Parse { .. }));
}

#[test]
fn custom_delimiters_apply_to_execute() {
	let renderer = Renderer::new(Delimiters::new("[[", "]]").unwrap()).unwrap();
	let mut projection = SecretProjection::new();
	renderer
		.execute(
			Some(&map(&[("out", "[[ .a ]]-{{ .a }}")])),
			&map(&[("a", "v")]),
			TemplateScope::Values,
			TemplateTarget::Labels,
			&mut projection,
		)
		.unwrap();
	assert_eq!(projection.labels.unwrap()["out"], "v-{{ .a }}");
}

proptest! {
	#[test]
	fn values_scope_is_deterministic_and_target_isolated(
		value in "[a-zA-Z0-9 ]{0,32}",
		keys in proptest::collection::btree_set("[a-z]{1,8}", 1..8),
	) {
		let templates: BTreeMap<String, Vec<u8>> = keys
			.iter()
			.map(|k| (k.clone(), b"{{ .v }}".to_vec()))
			.collect();
		let data = map(&[("v", value.as_str())]);

		let mut first = SecretProjection::new();
		let mut second = SecretProjection::new();
		for projection in [&mut first, &mut second] {
			execute(
				Some(&templates),
				&data,
				TemplateScope::Values,
				TemplateTarget::Annotations,
				projection,
			)
			.unwrap();
		}

		prop_assert_eq!(&first, &second);
		prop_assert!(first.data.is_none());
		prop_assert!(first.labels.is_none());
		let annotations = first.annotations.unwrap();
		prop_assert_eq!(annotations.len(), keys.len());
		prop_assert!(annotations.values().all(|v| v == &value));
	}
}
