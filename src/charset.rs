//! Media type parsing, formatting and charset pruning.

use std::collections::BTreeMap;

use mime_guess::Mime;

use crate::error::{MimeError, MimeErrorKind, MimeResult};

/// Parses a media type such as `text/plain; charset=utf-8`.
///
/// Returns the lowercased `type/subtype` and the parameters keyed by their
/// lowercased names. Quoted parameter values are unquoted. Whitespace around
/// the `;` separators is allowed; a malformed parameter is a parse error.
pub fn parse_media_type(value: &str) -> MimeResult<(String, BTreeMap<String, String>)> {
    if let Ok(parsed) = value.trim().parse::<Mime>() {
        let base = parsed.essence_str().to_ascii_lowercase();
        let params = parsed
            .params()
            .map(|(name, val)| (name.as_str().to_ascii_lowercase(), unquote(val.as_str())))
            .collect();
        return Ok((base, params));
    }

    // `mime` rejects some forms RFC 2045 allows, such as `text/plain ; charset=utf-8`
    let base = media_type_essence(value)
        .ok_or_else(|| MimeError::new(MimeErrorKind::Parse, format!("invalid media type {:?}", value)))?;
    let rest = value.split_once(';').map(|(_, rest)| rest).unwrap_or_default();
    let params = parse_params(rest).ok_or_else(|| {
        MimeError::new(MimeErrorKind::Parse, format!("invalid media parameter in {:?}", value))
    })?;
    Ok((base, params))
}

/// Formats a media type and its parameters into a canonical string.
///
/// Parameters are emitted sorted by name, values that are not plain tokens are
/// quoted. Returns an empty string if `base` is not a valid `type/subtype`.
pub fn format_media_type(base: &str, params: &BTreeMap<String, String>) -> String {
    let Some((major, minor)) = base.split_once('/') else {
        return String::new();
    };
    if !is_token(major) || !is_token(minor) {
        return String::new();
    }

    let mut formatted = base.to_ascii_lowercase();
    for (name, value) in params {
        if !is_token(name) {
            return String::new();
        }
        formatted.push_str("; ");
        formatted.push_str(&name.to_ascii_lowercase());
        formatted.push('=');
        if is_token(value) {
            formatted.push_str(value);
        } else {
            formatted.push('"');
            for c in value.chars() {
                if c == '"' || c == '\\' {
                    formatted.push('\\');
                }
                formatted.push(c);
            }
            formatted.push('"');
        }
    }
    formatted
}

/// Strips every parameter from `mime`, leaving the bare `type/subtype`.
///
/// Malformed parameters are ignored. Empty input or an invalid `type/subtype`
/// yields an empty string.
pub fn prune_charset(mime: &str) -> String {
    if mime.is_empty() {
        return String::new();
    }
    match parse_media_type(mime) {
        Ok((base, _)) => base,
        Err(_) => media_type_essence(mime).unwrap_or_default(),
    }
}

/// The lowercased `type/subtype` before the first `;`, if both halves are tokens.
fn media_type_essence(value: &str) -> Option<String> {
    let head = value.split(';').next()?.trim();
    let (major, minor) = head.split_once('/')?;
    if !is_token(major) || !is_token(minor) {
        return None;
    }
    Some(head.to_ascii_lowercase())
}

/// Parses `name=value` pairs separated by `;`, honouring quoted values.
/// Empty segments (a trailing `;`) are skipped.
fn parse_params(rest: &str) -> Option<BTreeMap<String, String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    for c in rest.chars() {
        if escaped {
            escaped = false;
        } else if quoted && c == '\\' {
            escaped = true;
        } else if c == '"' {
            quoted = !quoted;
        } else if c == ';' && !quoted {
            segments.push(std::mem::take(&mut current));
            continue;
        }
        current.push(c);
    }
    if quoted {
        return None;
    }
    segments.push(current);

    let mut params = BTreeMap::new();
    for segment in segments.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let (name, value) = segment.split_once('=')?;
        let (name, value) = (name.trim(), value.trim());
        if !is_token(name) {
            return None;
        }
        let value = if value.starts_with('"') {
            if value.len() < 2 || !value.ends_with('"') {
                return None;
            }
            unquote(value)
        } else if is_token(value) {
            value.to_string()
        } else {
            return None;
        };
        params.insert(name.to_ascii_lowercase(), value);
    }
    Some(params)
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut escaped = false;
        for c in inner.chars() {
            if escaped {
                out.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else {
                out.push(c);
            }
        }
        out
    } else {
        value.to_string()
    }
}

// RFC 2045 token characters.
fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_graphic() && !matches!(c, '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '=')
        })
}
