//! Default sniffing tree built from `infer` signature matchers.

use std::sync::Arc;

use crate::error::MimeResult;
use crate::hierarchy::{extend_tree, Detector, MimeHierarchy, MimeNode, DEFAULT_READ_LIMIT};
use crate::BINARY_MIME_TYPE;

type Signature = fn(&[u8]) -> bool;

// (mime, dotted extension, aliases, matcher)
const SIGNATURES: &[(&str, &str, &[&str], Signature)] = &[
    ("image/png", ".png", &[], infer::image::is_png),
    ("image/jpeg", ".jpg", &[], infer::image::is_jpeg),
    ("image/gif", ".gif", &[], infer::image::is_gif),
    ("image/webp", ".webp", &[], infer::image::is_webp),
    ("image/bmp", ".bmp", &["image/x-bmp"], infer::image::is_bmp),
    ("image/tiff", ".tiff", &[], infer::image::is_tiff),
    ("image/vnd.microsoft.icon", ".ico", &["image/x-icon"], infer::image::is_ico),
    ("application/pdf", ".pdf", &["application/x-pdf"], infer::archive::is_pdf),
    ("application/zip", ".zip", &["application/x-zip-compressed"], infer::archive::is_zip),
    ("application/gzip", ".gz", &["application/x-gzip"], infer::archive::is_gz),
    ("application/x-bzip2", ".bz2", &[], infer::archive::is_bz2),
    ("application/x-7z-compressed", ".7z", &[], infer::archive::is_7z),
    ("application/x-xz", ".xz", &[], infer::archive::is_xz),
    ("application/x-rar-compressed", ".rar", &["application/vnd.rar"], infer::archive::is_rar),
    ("application/x-tar", ".tar", &[], infer::archive::is_tar),
    ("application/vnd.sqlite3", ".sqlite", &["application/x-sqlite3"], infer::archive::is_sqlite),
    ("audio/mpeg", ".mp3", &[], infer::audio::is_mp3),
    ("audio/ogg", ".ogg", &[], infer::audio::is_ogg),
    ("audio/x-flac", ".flac", &["audio/flac"], infer::audio::is_flac),
    ("audio/x-wav", ".wav", &["audio/wav"], infer::audio::is_wav),
    ("video/mp4", ".mp4", &[], infer::video::is_mp4),
    ("video/webm", ".webm", &[], infer::video::is_webm),
    ("application/wasm", ".wasm", &[], infer::app::is_wasm),
    ("application/x-executable", ".elf", &["application/x-elf"], infer::app::is_elf),
];

/// The built-in content sniffing hierarchy.
///
/// ```text
/// application/octet-stream
/// ├── image/png, image/jpeg, application/zip, ... (infer signatures)
/// └── text/plain; charset=utf-8
///     ├── <types added with extend, newest first>
///     ├── text/html; charset=utf-8
///     ├── application/json
///     └── text/xml; charset=utf-8
/// ```
#[derive(Debug)]
pub struct SniffTree {
    root: Arc<MimeNode>,
    read_limit: u32,
}

impl SniffTree {
    pub fn new() -> Self {
        Self::with_read_limit(DEFAULT_READ_LIMIT)
    }

    pub fn with_read_limit(read_limit: u32) -> Self {
        let root = MimeNode::root(BINARY_MIME_TYPE, "", Arc::new(|_: &[u8], _: u32| true));

        // extend prepends, so children are added in reverse priority order
        let text = root.extend(Arc::new(is_utf8_text), "text/plain; charset=utf-8", ".txt");
        text.extend_with_aliases(Arc::new(is_xml), "text/xml; charset=utf-8", ".xml", &["application/xml"]);
        text.extend(Arc::new(is_json), "application/json", ".json");
        text.extend(Arc::new(is_html), "text/html; charset=utf-8", ".html");

        for (mime, extension, aliases, matcher) in SIGNATURES.iter().rev() {
            let matcher = *matcher;
            let detector: Detector = Arc::new(move |raw: &[u8], limit: u32| matcher(head(raw, limit)));
            root.extend_with_aliases(detector, mime, extension, aliases);
        }

        Self { root, read_limit }
    }

    pub fn root(&self) -> &Arc<MimeNode> {
        &self.root
    }
}

impl Default for SniffTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MimeHierarchy for SniffTree {
    fn lookup(&self, mime: &str) -> Option<Arc<MimeNode>> {
        self.root.find(mime)
    }

    fn extend(&self, parent: &str, detector: Detector, mime: &str, extension: &str) -> MimeResult<()> {
        extend_tree(&self.root, parent, detector, mime, extension)
    }

    fn detect(&self, raw: &[u8]) -> Arc<MimeNode> {
        self.root.detect(head(raw, self.read_limit), self.read_limit)
    }

    fn read_limit(&self) -> u32 {
        self.read_limit
    }
}

fn head(raw: &[u8], limit: u32) -> &[u8] {
    let limit = limit as usize;
    if limit > 0 && raw.len() > limit {
        &raw[..limit]
    } else {
        raw
    }
}

/// Valid UTF-8 without NUL bytes. A multi-byte sequence cut off by the read
/// limit still counts as text.
fn is_utf8_text(raw: &[u8], limit: u32) -> bool {
    let raw = head(raw, limit);
    if raw.contains(&0) {
        return false;
    }
    match std::str::from_utf8(raw) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

fn trimmed_lower(raw: &[u8], limit: u32) -> String {
    let raw = head(raw, limit);
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    String::from_utf8_lossy(raw).trim_start().to_ascii_lowercase()
}

fn is_html(raw: &[u8], limit: u32) -> bool {
    let text = trimmed_lower(raw, limit);
    ["<!doctype html", "<html", "<head", "<body", "<!--"]
        .iter()
        .any(|tag| text.starts_with(tag))
}

fn is_xml(raw: &[u8], limit: u32) -> bool {
    trimmed_lower(raw, limit).starts_with("<?xml")
}

fn is_json(raw: &[u8], limit: u32) -> bool {
    let text = trimmed_lower(raw, limit);
    let text = text.trim_end();
    let truncated = limit > 0 && raw.len() >= limit as usize;
    match text.chars().next() {
        Some('{') => truncated || text.ends_with('}'),
        Some('[') => truncated || text.ends_with(']'),
        _ => false,
    }
}
