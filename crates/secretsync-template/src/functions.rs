// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The template function table.
//!
//! Every name is installed twice: as a function taking arguments in
//! pipeline order (piped value last, `pkcs12keyPass("pw", cert)`) and as a
//! filter taking the piped value first (`cert | pkcs12keyPass("pw")`).
//! Nothing here reads process environment.
//!
//! Functions that can grow their input (`repeat`, `indent`, `replace`,
//! `join`, `printf`, the regex replacers) refuse to build a value larger
//! than [`MAX_VALUE_LEN`].
//!
//! The only minijinja tests installed are `defined`, `undefined` and `none`.
//! Built-in minijinja filters are not available; `len` stands in for
//! `length`.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use minijinja::value::{Rest, ValueKind};
use minijinja::{Environment, Error, ErrorKind, Value};
use regex::{NoExpand, Regex};
use sha2::{Digest, Sha256, Sha512};

use crate::crypto::{self, CryptoError};
use crate::output::MAX_VALUE_LEN;

/// bcrypt cost used by `htpasswd`.
const HTPASSWD_COST: u32 = 10;

type Call = fn(&[Value]) -> Result<Value, Error>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Order {
	/// Function form takes the piped value last.
	PipedLast,
	/// All arguments are equivalent; no reordering.
	Variadic,
}

struct Entry {
	name: &'static str,
	order: Order,
	call: Call,
}

const fn piped(name: &'static str, call: Call) -> Entry {
	Entry {
		name,
		order: Order::PipedLast,
		call,
	}
}

const fn variadic(name: &'static str, call: Call) -> Entry {
	Entry {
		name,
		order: Order::Variadic,
		call,
	}
}

// Filter argument order throughout: piped value first.
const CRYPTO: &[Entry] = &[
	piped("pkcs12key", pkcs12key),
	piped("pkcs12keyPass", pkcs12key_pass),
	piped("pkcs12cert", pkcs12cert),
	piped("pkcs12certPass", pkcs12cert_pass),
	piped("pemToPkcs12", pem_to_pkcs12),
	piped("pemToPkcs12Pass", pem_to_pkcs12_pass),
	piped("fullPemToPkcs12", full_pem_to_pkcs12),
	piped("fullPemToPkcs12Pass", full_pem_to_pkcs12_pass),
	piped("filterPEM", filter_pem),
	piped("filterCertChain", filter_cert_chain),
	piped("jwkPublicKeyPem", jwk_public_key_pem),
	piped("jwkPrivateKeyPem", jwk_private_key_pem),
	piped("toYaml", to_yaml),
	piped("fromYaml", from_yaml),
];

const HELPERS: &[Entry] = &[
	// encoding and digests
	piped("b64enc", b64enc),
	piped("b64dec", b64dec),
	piped("sha256sum", sha256sum),
	piped("sha512sum", sha512sum),
	piped("htpasswd", htpasswd),
	piped("toJson", to_json),
	piped("fromJson", from_json),
	// strings
	piped("upper", upper),
	piped("lower", lower),
	piped("title", title),
	piped("trim", trim),
	piped("trimAll", trim_all),
	piped("trimPrefix", trim_prefix),
	piped("trimSuffix", trim_suffix),
	piped("replace", replace),
	piped("contains", contains),
	piped("hasPrefix", has_prefix),
	piped("hasSuffix", has_suffix),
	piped("quote", quote),
	piped("squote", squote),
	piped("indent", indent),
	piped("nindent", nindent),
	piped("nospace", nospace),
	piped("repeat", repeat),
	piped("trunc", trunc),
	piped("abbrev", abbrev),
	piped("toString", to_string),
	variadic("printf", printf),
	// regular expressions
	piped("regexMatch", regex_match),
	piped("regexFind", regex_find),
	piped("regexFindAll", regex_find_all),
	piped("regexReplaceAll", regex_replace_all),
	piped("regexReplaceAllLiteral", regex_replace_all_literal),
	piped("regexSplit", regex_split),
	piped("regexQuoteMeta", regex_quote_meta),
	// lists
	piped("split", split),
	piped("join", join),
	variadic("list", list),
	piped("len", len),
	variadic("index", index),
	// maps
	variadic("dict", dict),
	piped("keys", keys),
	piped("values", values),
	piped("hasKey", has_key),
	piped("get", get),
	variadic("pluck", pluck),
	variadic("merge", merge),
	variadic("pick", pick),
	variadic("omit", omit),
	// defaults
	piped("default", default),
	piped("empty", empty),
	variadic("coalesce", coalesce),
];

/// Names of the format conversion functions.
pub fn function_names() -> Vec<&'static str> {
	CRYPTO.iter().map(|e| e.name).collect()
}

/// Names of the general-purpose helpers.
pub fn helper_names() -> Vec<&'static str> {
	HELPERS.iter().map(|e| e.name).collect()
}

/// Install every function, filter and test into `env`.
pub(crate) fn install(env: &mut Environment<'static>) {
	for entry in CRYPTO.iter().chain(HELPERS) {
		let call = entry.call;
		let order = entry.order;
		env.add_filter(entry.name, move |args: Rest<Value>| call(&args));
		env.add_function(entry.name, move |args: Rest<Value>| {
			let mut args = args.0;
			if order == Order::PipedLast && !args.is_empty() {
				args.rotate_right(1);
			}
			call(&args)
		});
	}
	env.add_test("defined", minijinja::tests::is_defined);
	env.add_test("undefined", minijinja::tests::is_undefined);
	env.add_test("none", minijinja::tests::is_none);
}

fn crypto_error(err: CryptoError) -> Error {
	Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}

fn invalid(msg: impl Into<String>) -> Error {
	Error::new(ErrorKind::InvalidOperation, msg.into())
}

/// Check a projected output size against [`MAX_VALUE_LEN`]. `None` means
/// the size overflowed `usize`.
fn within_limit(len: Option<usize>, what: &str) -> Result<(), Error> {
	match len {
		Some(n) if n <= MAX_VALUE_LEN => Ok(()),
		_ => Err(invalid(format!(
			"{what} result would exceed {MAX_VALUE_LEN} bytes"
		))),
	}
}

fn arity(args: &[Value], n: usize) -> Result<(), Error> {
	match args.len().cmp(&n) {
		std::cmp::Ordering::Less => Err(Error::new(
			ErrorKind::MissingArgument,
			format!("expected {n} arguments, got {}", args.len()),
		)),
		std::cmp::Ordering::Greater => Err(Error::new(
			ErrorKind::TooManyArguments,
			format!("expected {n} arguments, got {}", args.len()),
		)),
		std::cmp::Ordering::Equal => Ok(()),
	}
}

/// String view of a value. Binary values are refused rather than decoded
/// lossily.
fn text(v: &Value) -> Result<String, Error> {
	if let Some(s) = v.as_str() {
		return Ok(s.to_string());
	}
	if v.kind() == ValueKind::Bytes {
		let raw = v.as_bytes().unwrap_or_default();
		return String::from_utf8(raw.to_vec())
			.map_err(|_| invalid("value is binary; encode it with b64enc first"));
	}
	Ok(v.to_string())
}

fn bytes(v: &Value) -> Result<Vec<u8>, Error> {
	v.as_bytes()
		.map(<[u8]>::to_vec)
		.ok_or_else(|| invalid(format!("expected string or bytes, got {}", v.kind())))
}

fn raw(v: &Value) -> Vec<u8> {
	v.as_bytes()
		.map(<[u8]>::to_vec)
		.unwrap_or_else(|| v.to_string().into_bytes())
}

fn int(v: &Value) -> Result<i64, Error> {
	i64::try_from(v.clone())
}

fn unary(args: &[Value], f: impl FnOnce(&str) -> String) -> Result<Value, Error> {
	arity(args, 1)?;
	Ok(Value::from(f(&text(&args[0])?)))
}

fn bytes_or_text(raw: Vec<u8>) -> Value {
	match String::from_utf8(raw) {
		Ok(s) => Value::from(s),
		Err(e) => Value::from_bytes(e.into_bytes()),
	}
}

fn texts(v: &Value) -> Result<Vec<String>, Error> {
	v.try_iter()?.map(|item| text(&item)).collect()
}

fn map_entries(v: &Value) -> Result<BTreeMap<String, Value>, Error> {
	if v.kind() != ValueKind::Map {
		return Err(invalid(format!("expected a map, got {}", v.kind())));
	}
	v.try_iter()?
		.map(|k| Ok((text(&k)?, v.get_item(&k)?)))
		.collect()
}

// Crypto converters.

fn pkcs12key(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	crypto::pkcs12_key(&bytes(&args[0])?, "")
		.map(Value::from)
		.map_err(crypto_error)
}

fn pkcs12key_pass(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	crypto::pkcs12_key(&bytes(&args[0])?, &text(&args[1])?)
		.map(Value::from)
		.map_err(crypto_error)
}

fn pkcs12cert(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	crypto::pkcs12_cert(&bytes(&args[0])?, "")
		.map(Value::from)
		.map_err(crypto_error)
}

fn pkcs12cert_pass(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	crypto::pkcs12_cert(&bytes(&args[0])?, &text(&args[1])?)
		.map(Value::from)
		.map_err(crypto_error)
}

// key | pemToPkcs12(cert)
fn pem_to_pkcs12(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	crypto::pem_to_pkcs12(&text(&args[1])?, &text(&args[0])?, "")
		.map(Value::from)
		.map_err(crypto_error)
}

// pass | pemToPkcs12Pass(cert, key)
fn pem_to_pkcs12_pass(args: &[Value]) -> Result<Value, Error> {
	arity(args, 3)?;
	crypto::pem_to_pkcs12(&text(&args[1])?, &text(&args[2])?, &text(&args[0])?)
		.map(Value::from)
		.map_err(crypto_error)
}

fn full_pem_to_pkcs12(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	crypto::full_pem_to_pkcs12(&text(&args[0])?, "")
		.map(Value::from)
		.map_err(crypto_error)
}

// pass | fullPemToPkcs12Pass(pem)
fn full_pem_to_pkcs12_pass(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	crypto::full_pem_to_pkcs12(&text(&args[1])?, &text(&args[0])?)
		.map(Value::from)
		.map_err(crypto_error)
}

fn filter_pem(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	crypto::filter_pem(&text(&args[1])?, &text(&args[0])?)
		.map(Value::from)
		.map_err(crypto_error)
}

fn filter_cert_chain(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	crypto::filter_cert_chain(&text(&args[1])?, &text(&args[0])?)
		.map(Value::from)
		.map_err(crypto_error)
}

fn jwk_public_key_pem(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	crypto::jwk_public_key_pem(&text(&args[0])?)
		.map(Value::from)
		.map_err(crypto_error)
}

fn jwk_private_key_pem(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	crypto::jwk_private_key_pem(&text(&args[0])?)
		.map(Value::from)
		.map_err(crypto_error)
}

fn to_yaml(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	let out = serde_yaml::to_string(&args[0])
		.map_err(|e| crypto_error(CryptoError::Yaml(e.to_string())))?;
	Ok(Value::from(out.trim_end_matches('\n')))
}

fn from_yaml(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	let parsed: serde_yaml::Value = serde_yaml::from_str(&text(&args[0])?)
		.map_err(|e| crypto_error(CryptoError::Yaml(e.to_string())))?;
	Ok(Value::from_serialize(&parsed))
}

// Encoding and digests.

fn b64enc(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	Ok(Value::from(STANDARD.encode(raw(&args[0]))))
}

fn b64dec(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	let raw = STANDARD
		.decode(text(&args[0])?.trim())
		.map_err(|e| invalid(format!("base64 decode error: {e}")))?;
	Ok(bytes_or_text(raw))
}

fn sha256sum(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	Ok(Value::from(hex::encode(Sha256::digest(raw(&args[0])))))
}

fn sha512sum(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	Ok(Value::from(hex::encode(Sha512::digest(raw(&args[0])))))
}

// password | htpasswd(user)
fn htpasswd(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let password = text(&args[0])?;
	let user = text(&args[1])?;
	if user.contains(':') {
		return Err(invalid("htpasswd user must not contain ':'"));
	}
	let hash = bcrypt::hash_with_result(password, HTPASSWD_COST)
		.map_err(|e| invalid(format!("htpasswd: {e}")))?;
	Ok(Value::from(format!(
		"{user}:{}",
		hash.format_for_version(bcrypt::Version::TwoA)
	)))
}

fn to_json(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	serde_json::to_string(&args[0])
		.map(Value::from)
		.map_err(|e| crypto_error(CryptoError::Json(e.to_string())))
}

fn from_json(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	let parsed: serde_json::Value = serde_json::from_str(&text(&args[0])?)
		.map_err(|e| crypto_error(CryptoError::Json(e.to_string())))?;
	Ok(Value::from_serialize(&parsed))
}

// Strings.

fn upper(args: &[Value]) -> Result<Value, Error> {
	unary(args, str::to_uppercase)
}

fn lower(args: &[Value]) -> Result<Value, Error> {
	unary(args, str::to_lowercase)
}

fn title(args: &[Value]) -> Result<Value, Error> {
	unary(args, |s| {
		let mut out = String::with_capacity(s.len());
		let mut at_word_start = true;
		for ch in s.chars() {
			if at_word_start {
				out.extend(ch.to_uppercase());
			} else {
				out.push(ch);
			}
			at_word_start = ch.is_whitespace();
		}
		out
	})
}

fn trim(args: &[Value]) -> Result<Value, Error> {
	unary(args, |s| s.trim().to_string())
}

fn nospace(args: &[Value]) -> Result<Value, Error> {
	unary(args, |s| s.chars().filter(|c| !c.is_whitespace()).collect())
}

fn quote(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	serde_json::to_string(&text(&args[0])?)
		.map(Value::from)
		.map_err(|e| invalid(e.to_string()))
}

fn squote(args: &[Value]) -> Result<Value, Error> {
	unary(args, |s| format!("'{s}'"))
}

fn to_string(args: &[Value]) -> Result<Value, Error> {
	unary(args, str::to_string)
}

// s | trimAll(cutset)
fn trim_all(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let cutset = text(&args[1])?;
	Ok(Value::from(
		text(&args[0])?.trim_matches(|c: char| cutset.contains(c)),
	))
}

fn trim_prefix(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let s = text(&args[0])?;
	let prefix = text(&args[1])?;
	Ok(Value::from(s.strip_prefix(prefix.as_str()).unwrap_or(&s)))
}

fn trim_suffix(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let s = text(&args[0])?;
	let suffix = text(&args[1])?;
	Ok(Value::from(s.strip_suffix(suffix.as_str()).unwrap_or(&s)))
}

// s | replace(old, new)
fn replace(args: &[Value]) -> Result<Value, Error> {
	arity(args, 3)?;
	let s = text(&args[0])?;
	let old = text(&args[1])?;
	let new = text(&args[2])?;
	let hits = s.matches(old.as_str()).count();
	within_limit(
		hits.checked_mul(new.len()).and_then(|n| n.checked_add(s.len())),
		"replace",
	)?;
	Ok(Value::from(s.replace(&old, &new)))
}

fn contains(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	Ok(Value::from(text(&args[0])?.contains(&text(&args[1])?)))
}

fn has_prefix(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	Ok(Value::from(text(&args[0])?.starts_with(&text(&args[1])?)))
}

fn has_suffix(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	Ok(Value::from(text(&args[0])?.ends_with(&text(&args[1])?)))
}

fn pad_lines(s: &str, width: i64) -> Result<String, Error> {
	let width = usize::try_from(width).unwrap_or(0);
	let lines = s.matches('\n').count() + 1;
	within_limit(
		width.checked_mul(lines).and_then(|n| n.checked_add(s.len())),
		"indent",
	)?;
	let pad = " ".repeat(width);
	Ok(format!("{pad}{}", s.replace('\n', &format!("\n{pad}"))))
}

// s | indent(n)
fn indent(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	Ok(Value::from(pad_lines(&text(&args[0])?, int(&args[1])?)?))
}

fn nindent(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let padded = pad_lines(&text(&args[0])?, int(&args[1])?)?;
	Ok(Value::from(format!("\n{padded}")))
}

fn repeat(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let s = text(&args[0])?;
	let count = usize::try_from(int(&args[1])?)
		.map_err(|_| invalid("repeat count must not be negative"))?;
	within_limit(s.len().checked_mul(count), "repeat")?;
	Ok(Value::from(s.repeat(count)))
}

fn char_count(s: &str) -> usize {
	s.chars().count()
}

// s | trunc(n); a negative n keeps the last |n| characters.
fn trunc(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let s = text(&args[0])?;
	let n = int(&args[1])?;
	let len = char_count(&s) as i64;
	let out: String = if n < 0 && len + n > 0 {
		s.chars().skip((len + n) as usize).collect()
	} else if n >= 0 && len > n {
		s.chars().take(n as usize).collect()
	} else {
		s
	};
	Ok(Value::from(out))
}

// s | abbrev(width)
fn abbrev(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let s = text(&args[0])?;
	let width = int(&args[1])?;
	if width < 4 || char_count(&s) as i64 <= width {
		return Ok(Value::from(s));
	}
	let head: String = s.chars().take(width as usize - 3).collect();
	Ok(Value::from(format!("{head}...")))
}

// printf(format, args...). Supports %s %v %d %q %x %t and %%.
fn printf(args: &[Value]) -> Result<Value, Error> {
	let (format, rest) = args
		.split_first()
		.ok_or_else(|| Error::new(ErrorKind::MissingArgument, "printf needs a format"))?;
	let format = text(format)?;
	let mut operands = rest.iter();
	let mut out = String::with_capacity(format.len());
	let mut chars = format.chars();

	while let Some(c) = chars.next() {
		if c != '%' {
			out.push(c);
			continue;
		}
		let verb = chars
			.next()
			.ok_or_else(|| invalid("printf format ends with '%'"))?;
		if verb == '%' {
			out.push('%');
			continue;
		}
		let operand = operands
			.next()
			.ok_or_else(|| invalid(format!("printf: missing operand for %{verb}")))?;
		let piece = match verb {
			's' | 'v' => text(operand)?,
			'd' => int(operand)?.to_string(),
			't' => operand.is_true().to_string(),
			'q' => serde_json::to_string(&text(operand)?).map_err(|e| invalid(e.to_string()))?,
			'x' => match operand.as_i64() {
				Some(n) => format!("{n:x}"),
				None => hex::encode(raw(operand)),
			},
			other => return Err(invalid(format!("printf: unsupported verb %{other}"))),
		};
		within_limit(out.len().checked_add(piece.len()), "printf")?;
		out.push_str(&piece);
	}

	if operands.next().is_some() {
		return Err(invalid("printf: too many operands for format"));
	}
	Ok(Value::from(out))
}

// Regular expressions. Go argument order is (regex, s, ...); the piped
// value is the last Go argument.

fn compile(v: &Value) -> Result<Regex, Error> {
	Regex::new(&text(v)?).map_err(|e| invalid(format!("invalid regular expression: {e}")))
}

// s | regexMatch(regex)
fn regex_match(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	Ok(Value::from(compile(&args[1])?.is_match(&text(&args[0])?)))
}

// s | regexFind(regex)
fn regex_find(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let s = text(&args[0])?;
	let found = compile(&args[1])?.find(&s).map(|m| m.as_str()).unwrap_or("");
	Ok(Value::from(found))
}

// n | regexFindAll(regex, s); negative n returns every match.
fn regex_find_all(args: &[Value]) -> Result<Value, Error> {
	arity(args, 3)?;
	let limit = usize::try_from(int(&args[0])?).unwrap_or(usize::MAX);
	let s = text(&args[2])?;
	let found: Vec<String> = compile(&args[1])?
		.find_iter(&s)
		.take(limit)
		.map(|m| m.as_str().to_owned())
		.collect();
	Ok(Value::from(found))
}

// repl | regexReplaceAll(regex, s); `$1` and `${name}` expand.
fn regex_replace_all(args: &[Value]) -> Result<Value, Error> {
	arity(args, 3)?;
	let repl = text(&args[0])?;
	let re = compile(&args[1])?;
	let s = text(&args[2])?;
	// Each reference expands to at most the whole match.
	let refs = repl.matches('$').count();

	let mut out = String::with_capacity(s.len());
	let mut last = 0;
	for caps in re.captures_iter(&s) {
		let Some(m) = caps.get(0) else {
			continue;
		};
		let bound = out
			.len()
			.saturating_add(m.start() - last)
			.saturating_add(repl.len())
			.saturating_add(refs.saturating_mul(m.len()));
		within_limit(Some(bound), "regexReplaceAll")?;
		out.push_str(&s[last..m.start()]);
		caps.expand(&repl, &mut out);
		last = m.end();
	}
	out.push_str(&s[last..]);
	Ok(Value::from(out))
}

// repl | regexReplaceAllLiteral(regex, s)
fn regex_replace_all_literal(args: &[Value]) -> Result<Value, Error> {
	arity(args, 3)?;
	let repl = text(&args[0])?;
	let re = compile(&args[1])?;
	let s = text(&args[2])?;
	let hits = re.find_iter(&s).count();
	within_limit(
		hits.checked_mul(repl.len()).and_then(|n| n.checked_add(s.len())),
		"regexReplaceAllLiteral",
	)?;
	Ok(Value::from(re.replace_all(&s, NoExpand(&repl)).into_owned()))
}

// n | regexSplit(regex, s); negative n splits everywhere, zero yields
// nothing.
fn regex_split(args: &[Value]) -> Result<Value, Error> {
	arity(args, 3)?;
	let n = int(&args[0])?;
	let re = compile(&args[1])?;
	let s = text(&args[2])?;
	let parts: Vec<String> = match usize::try_from(n) {
		Ok(0) => Vec::new(),
		Ok(n) => re.splitn(&s, n).map(str::to_owned).collect(),
		Err(_) => re.split(&s).map(str::to_owned).collect(),
	};
	Ok(Value::from(parts))
}

fn regex_quote_meta(args: &[Value]) -> Result<Value, Error> {
	unary(args, regex::escape)
}

// Lists.

// s | split(sep) yields a list.
fn split(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let sep = text(&args[1])?;
	let parts: Vec<String> = text(&args[0])?
		.split(sep.as_str())
		.map(String::from)
		.collect();
	Ok(Value::from(parts))
}

// list | join(sep)
fn join(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let parts = texts(&args[0])?;
	let sep = text(&args[1])?;
	let total = parts
		.iter()
		.try_fold(0usize, |acc, p| acc.checked_add(p.len()))
		.and_then(|n| {
			sep.len()
				.checked_mul(parts.len().saturating_sub(1))
				.and_then(|s| s.checked_add(n))
		});
	within_limit(total, "join")?;
	Ok(Value::from(parts.join(&sep)))
}

fn list(args: &[Value]) -> Result<Value, Error> {
	Ok(Value::from(args.to_vec()))
}

// Go's len: bytes for strings, items for lists and maps.
fn len(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	let v = &args[0];
	let n = match v.kind() {
		ValueKind::String | ValueKind::Bytes => v.as_bytes().map(<[u8]>::len),
		ValueKind::Seq | ValueKind::Map => v.len(),
		_ => None,
	};
	n.map(Value::from)
		.ok_or_else(|| invalid(format!("len of {} is undefined", v.kind())))
}

// index(collection, keys...)
fn index(args: &[Value]) -> Result<Value, Error> {
	let (collection, keys) = args
		.split_first()
		.ok_or_else(|| Error::new(ErrorKind::MissingArgument, "index needs a collection"))?;
	let mut current = collection.clone();
	for key in keys {
		let item = current.get_item(key)?;
		current = if !item.is_undefined() {
			item
		} else if current.kind() == ValueKind::Map {
			Value::from(())
		} else {
			return Err(invalid(format!("index {key} out of range")));
		};
	}
	Ok(current)
}

// Maps.

fn dict(args: &[Value]) -> Result<Value, Error> {
	if args.len() % 2 != 0 {
		return Err(invalid("dict expects an even number of arguments"));
	}
	let map = args
		.chunks(2)
		.map(|pair| Ok((text(&pair[0])?, pair[1].clone())))
		.collect::<Result<BTreeMap<String, Value>, Error>>()?;
	Ok(Value::from(map))
}

fn keys(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	let mut names = texts(&args[0])?;
	names.sort();
	Ok(Value::from(names))
}

fn values(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	let entries = map_entries(&args[0])?;
	Ok(Value::from(entries.into_values().collect::<Vec<_>>()))
}

// key | hasKey(dict)
fn has_key(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let key = text(&args[0])?;
	Ok(Value::from(map_entries(&args[1])?.contains_key(&key)))
}

// key | get(dict); a missing key yields "".
fn get(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	let key = text(&args[0])?;
	Ok(map_entries(&args[1])?
		.remove(&key)
		.unwrap_or_else(|| Value::from("")))
}

// pluck(key, dicts...)
fn pluck(args: &[Value]) -> Result<Value, Error> {
	let (key, maps) = args
		.split_first()
		.ok_or_else(|| Error::new(ErrorKind::MissingArgument, "pluck needs a key"))?;
	let key = text(key)?;
	let mut found = Vec::new();
	for map in maps {
		if let Some(v) = map_entries(map)?.remove(&key) {
			found.push(v);
		}
	}
	Ok(Value::from(found))
}

// merge(dst, srcs...); keys already present win.
fn merge(args: &[Value]) -> Result<Value, Error> {
	if args.is_empty() {
		return Err(Error::new(ErrorKind::MissingArgument, "merge needs a map"));
	}
	let mut merged = BTreeMap::new();
	for map in args {
		for (k, v) in map_entries(map)? {
			merged.entry(k).or_insert(v);
		}
	}
	Ok(Value::from(merged))
}

fn selected(args: &[Value], keep: bool) -> Result<Value, Error> {
	let (map, names) = args
		.split_first()
		.ok_or_else(|| Error::new(ErrorKind::MissingArgument, "expected a map"))?;
	let names = names.iter().map(text).collect::<Result<Vec<_>, _>>()?;
	let entries: BTreeMap<String, Value> = map_entries(map)?
		.into_iter()
		.filter(|(k, _)| names.contains(k) == keep)
		.collect();
	Ok(Value::from(entries))
}

// pick(dict, keys...)
fn pick(args: &[Value]) -> Result<Value, Error> {
	selected(args, true)
}

// omit(dict, keys...)
fn omit(args: &[Value]) -> Result<Value, Error> {
	selected(args, false)
}

// Defaults.

// given | default(fallback)
fn default(args: &[Value]) -> Result<Value, Error> {
	arity(args, 2)?;
	if args[0].is_true() {
		Ok(args[0].clone())
	} else {
		Ok(args[1].clone())
	}
}

fn empty(args: &[Value]) -> Result<Value, Error> {
	arity(args, 1)?;
	Ok(Value::from(!args[0].is_true()))
}

fn coalesce(args: &[Value]) -> Result<Value, Error> {
	Ok(args
		.iter()
		.find(|v| v.is_true())
		.cloned()
		.unwrap_or(Value::from(())))
}
