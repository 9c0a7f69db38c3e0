// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Byte-exact template output.
//!
//! minijinja renders to text, but secret values may be arbitrary bytes
//! (PKCS12 bundles, DER keys). Byte values are written as code points from a
//! reserved block at the top of plane 16 and mapped back to raw bytes once
//! rendering finishes. Text that already contains a reserved code point is
//! rejected, so the mapping never changes a real character.

use std::fmt::Write as _;
use std::io;

use minijinja::value::ValueKind;
use minijinja::{Error, ErrorKind, Output, State, Value};

/// Largest value a single template function may produce.
pub const MAX_VALUE_LEN: usize = 1 << 20;

/// Largest rendered output for one template, in encoded bytes.
pub const MAX_RENDERED_LEN: usize = 4 * MAX_VALUE_LEN;

/// First code point of the raw byte block; byte `b` maps to `RAW_BASE + b`.
const RAW_BASE: u32 = 0x10_FF00;

fn is_reserved(c: char) -> bool {
	u32::from(c) >= RAW_BASE
}

/// Fails when `s` contains a code point from the raw byte block.
pub(crate) fn ensure_unreserved(s: &str) -> Result<(), Error> {
	match s.chars().find(|c| is_reserved(*c)) {
		Some(c) => Err(Error::new(
			ErrorKind::InvalidOperation,
			format!("reserved code point U+{:X} in template text", u32::from(c)),
		)),
		None => Ok(()),
	}
}

/// Formatter installed on every renderer environment.
pub(crate) fn format_value(out: &mut Output, state: &State, value: &Value) -> Result<(), Error> {
	match value.kind() {
		ValueKind::Bytes => {
			let raw = value.as_bytes().unwrap_or_default();
			for &byte in raw {
				let c = char::from_u32(RAW_BASE + u32::from(byte)).ok_or_else(|| {
					Error::new(ErrorKind::InvalidOperation, "unencodable byte value")
				})?;
				out.write_char(c).map_err(|_| {
					Error::new(ErrorKind::WriteFailure, "failed to write template output")
				})?;
			}
			Ok(())
		}
		ValueKind::String => {
			ensure_unreserved(value.as_str().unwrap_or_default())?;
			minijinja::escape_formatter(out, state, value)
		}
		ValueKind::Seq | ValueKind::Map => {
			ensure_unreserved(&value.to_string())?;
			minijinja::escape_formatter(out, state, value)
		}
		_ => minijinja::escape_formatter(out, state, value),
	}
}

/// Collects rendered text and refuses to grow past its limit.
pub(crate) struct BoundedSink {
	buf: Vec<u8>,
	limit: usize,
}

impl BoundedSink {
	pub(crate) fn new(limit: usize) -> Self {
		Self {
			buf: Vec::new(),
			limit,
		}
	}

	/// Map the rendered text back to the bytes it stands for.
	pub(crate) fn into_bytes(self) -> Result<Vec<u8>, Error> {
		let text = String::from_utf8(self.buf).map_err(|e| {
			Error::new(ErrorKind::InvalidOperation, "rendered output is not UTF-8").with_source(e)
		})?;
		Ok(decode_raw(&text))
	}
}

impl io::Write for BoundedSink {
	fn write(&mut self, chunk: &[u8]) -> io::Result<usize> {
		if self.buf.len().saturating_add(chunk.len()) > self.limit {
			return Err(io::Error::new(
				io::ErrorKind::Other,
				format!("rendered output exceeds {} bytes", self.limit),
			));
		}
		self.buf.extend_from_slice(chunk);
		Ok(chunk.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

fn decode_raw(text: &str) -> Vec<u8> {
	let mut out = Vec::with_capacity(text.len());
	let mut utf8 = [0u8; 4];
	for c in text.chars() {
		match u32::from(c).checked_sub(RAW_BASE) {
			// Plane 16 ends at U+10FFFF, so the offset always fits a byte.
			Some(offset) => out.push(offset as u8),
			None => out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes()),
		}
	}
	out
}
