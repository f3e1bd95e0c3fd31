#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Shared helpers for turning the textual parts of a `$ref` into canonical form.
//!
//! These utilities never fetch documents: they only rewrite identifiers so that a
//! relative document part can be looked up in the in-memory store.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

const DUMMY_BASE: &str = "http://example.invalid/";

/// Characters escaped when a pointer token is written back into a URI fragment.
const FRAGMENT_TOKEN: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Decodes a JSON Pointer segment taken from a URI fragment.
///
/// Percent-escapes are decoded first, then `~1` and `~0` (in that order).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let unescaped = percent_decode_str(segment).decode_utf8_lossy();
    unescaped.replace("~1", "/").replace("~0", "~")
}

/// Encodes a decoded token back into its fragment form. Exact inverse of
/// [`decode_pointer_segment`].
pub(crate) fn encode_pointer_segment(token: &str) -> String {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    utf8_percent_encode(&escaped, FRAGMENT_TOKEN).to_string()
}

/// Normalizes a document id so that equivalent spellings share one store key.
///
/// Absolute URLs go through `url` normalization; plain paths have `.` and `..`
/// segments folded while keeping their relative / absolute nature.
pub(crate) fn canonical_document_id(id: &str) -> Option<String> {
    if let Ok(url) = Url::parse(id) {
        return Some(url.to_string());
    }
    join_plain_path(id, if id.starts_with('/') { "/" } else { "" })
}

/// Resolves the document part of a `$ref` against the current document id
/// (directory-relative semantics).
///
/// Returns `None` if the combination cannot be expressed as a document id.
pub(crate) fn resolve_document_id(doc: &str, current: &str) -> Option<String> {
    if let Ok(url) = Url::parse(doc) {
        return Some(url.to_string());
    }
    if doc.starts_with('/') {
        return canonical_document_id(doc);
    }
    if let Ok(base) = Url::parse(current) {
        return base.join(doc).ok().map(|u| u.to_string());
    }
    let dummy = Url::parse(DUMMY_BASE).ok()?;
    let base = dummy.join(current).ok()?;
    let joined = base.join(doc).ok()?;
    let path = percent_decode_str(joined.path())
        .decode_utf8_lossy()
        .into_owned();
    if current.starts_with('/') {
        Some(path)
    } else {
        Some(path.trim_start_matches('/').to_string())
    }
}

fn join_plain_path(id: &str, base: &str) -> Option<String> {
    let dummy = Url::parse(DUMMY_BASE).ok()?;
    let joined = dummy.join(base).ok()?.join(id).ok()?;
    let path = percent_decode_str(joined.path())
        .decode_utf8_lossy()
        .into_owned();
    if id.starts_with('/') {
        Some(path)
    } else {
        Some(path.trim_start_matches('/').to_string())
    }
}
