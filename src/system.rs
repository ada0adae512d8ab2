//! System MIME database.
//!
//! Resolves dotted file extensions to media types using, in order:
//! - types added at runtime with [`SystemDatabase::add_extension_type`]
//! - types loaded from the freedesktop shared-mime-info `globs2` files, or when
//!   none of those yield anything, from Apache style `mime.types` files
//! - the static table compiled into `mime_guess`
//!
//! `globs2` files are looked up under `$XDG_DATA_HOME/mime/globs2` and each
//! `$XDG_DATA_DIRS` entry, matching shared-mime-info's search order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::charset::{format_media_type, parse_media_type};
use crate::error::{MimeError, MimeErrorKind, MimeResult};
use crate::lookup::Lookup;

const MIME_TYPES_FILES: &[&str] = &[
    "/etc/mime.types",
    "/etc/apache2/mime.types",
    "/etc/apache/mime.types",
    "/etc/httpd/conf/mime.types",
];

const DEFAULT_DATA_DIRS: &str = "/usr/local/share:/usr/share";

/// Controls which files a [`SystemDatabase`] loads at construction.
#[derive(Debug, Clone)]
pub struct SystemDatabaseConfig {
    /// Load the standard `globs2` and `mime.types` locations.
    pub load_system_files: bool,
    /// Additional `globs2` files, read after the standard ones.
    pub globs_files: Vec<PathBuf>,
    /// Additional `mime.types` files, always read.
    pub mime_types_files: Vec<PathBuf>,
}

impl Default for SystemDatabaseConfig {
    fn default() -> Self {
        Self {
            load_system_files: true,
            globs_files: Vec::new(),
            mime_types_files: Vec::new(),
        }
    }
}

impl SystemDatabaseConfig {
    /// A configuration that only uses the static table and runtime additions.
    pub fn builtin_only() -> Self {
        Self {
            load_system_files: false,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct SystemDatabase {
    added: Lookup,
    loaded: HashMap<String, String>,
}

impl SystemDatabase {
    pub fn new() -> Self {
        Self::with_config(&SystemDatabaseConfig::default())
    }

    pub fn with_config(config: &SystemDatabaseConfig) -> Self {
        let mut loaded = HashMap::new();

        let mut globs_files = Vec::new();
        if config.load_system_files {
            globs_files.extend(globs2_locations());
        }
        globs_files.extend(config.globs_files.iter().cloned());
        for file in &globs_files {
            load_globs2_file(file, &mut loaded);
        }

        if loaded.is_empty() && config.load_system_files {
            for file in MIME_TYPES_FILES {
                load_mime_types_file(Path::new(file), &mut loaded);
            }
        }
        for file in &config.mime_types_files {
            load_mime_types_file(file, &mut loaded);
        }

        log::debug!("System MIME database loaded {} extension(s) from files", loaded.len());

        Self {
            added: Lookup::new(),
            loaded,
        }
    }

    /// Looks up the media type for a file extension such as `.zip`.
    ///
    /// The leading dot is optional and matching ignores ASCII case.
    pub fn lookup_by_extension(&self, extension: &str) -> Option<String> {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        if extension.is_empty() {
            return None;
        }
        let extension = extension.to_ascii_lowercase();

        if let Some(mime) = self.added.get(&extension) {
            return Some(mime);
        }
        if let Some(mime) = self.loaded.get(&extension) {
            return Some(mime.clone());
        }

        let mime = mime_guess::from_ext(&extension).first_raw()?;
        if mime.starts_with("text/") {
            Some(format!("{}; charset=utf-8", mime))
        } else {
            Some(mime.to_string())
        }
    }

    /// Associates a dotted extension with a media type.
    ///
    /// `text/*` types without a charset parameter are given `charset=utf-8`.
    pub fn add_extension_type(&self, extension: &str, mime: &str) -> MimeResult<()> {
        let Some(bare) = extension.strip_prefix('.') else {
            return Err(MimeError::new(
                MimeErrorKind::InvalidArg,
                format!("extension {:?} must begin with a dot", extension),
            ));
        };
        if bare.is_empty() {
            return Err(MimeError::new(MimeErrorKind::InvalidArg, "extension must not be empty"));
        }

        let (base, mut params) = parse_media_type(mime)?;
        if base.starts_with("text/") && !params.contains_key("charset") {
            params.insert("charset".to_string(), "utf-8".to_string());
        }
        let formatted = format_media_type(&base, &params);
        if formatted.is_empty() {
            return Err(MimeError::new(
                MimeErrorKind::Parse,
                format!("cannot format media type {:?}", mime),
            ));
        }

        log::debug!("System MIME database: .{} -> {}", bare, formatted);
        self.added.set(bare.to_ascii_lowercase(), formatted);
        Ok(())
    }
}

impl Default for SystemDatabase {
    fn default() -> Self {
        Self::new()
    }
}

fn globs2_locations() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    let data_home = std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| BaseDirs::new().map(|d| d.data_dir().to_path_buf()));
    if let Some(home) = data_home {
        dirs.push(home);
    }

    let data_dirs = std::env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_DIRS.to_string());
    dirs.extend(data_dirs.split(':').filter(|d| !d.is_empty()).map(PathBuf::from));

    dirs.into_iter().map(|d| d.join("mime").join("globs2")).collect()
}

fn read_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            log::debug!("Skipping MIME database file {}: {}", path.display(), e);
            None
        }
    }
}

fn load_globs2_file(path: &Path, into: &mut HashMap<String, String>) {
    if let Some(content) = read_file(path) {
        parse_globs2(&content, into);
    }
}

fn load_mime_types_file(path: &Path, into: &mut HashMap<String, String>) {
    if let Some(content) = read_file(path) {
        parse_mime_types(&content, into);
    }
}

/// Parses shared-mime-info `globs2` lines of the form `weight:type:glob[:flags]`.
///
/// Only simple `*.ext` globs are used. Files are weight-sorted, so the first
/// entry for an extension wins.
fn parse_globs2(content: &str, into: &mut HashMap<String, String>) {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split(':');
        let (Some(_weight), Some(mime), Some(glob)) = (fields.next(), fields.next(), fields.next()) else {
            continue;
        };
        let Some(extension) = glob.strip_prefix("*.") else {
            continue;
        };
        if extension.is_empty() || extension.contains(['*', '?', '[']) || mime.is_empty() {
            continue;
        }

        into.entry(extension.to_ascii_lowercase())
            .or_insert_with(|| with_text_charset(mime));
    }
}

/// Parses `mime.types` lines of the form `type/subtype ext1 ext2 ...`.
///
/// Later entries override earlier ones.
fn parse_mime_types(content: &str, into: &mut HashMap<String, String>) {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let Some(mime) = fields.next() else {
            continue;
        };
        if !mime.contains('/') {
            continue;
        }
        for extension in fields {
            into.insert(extension.to_ascii_lowercase(), with_text_charset(mime));
        }
    }
}

fn with_text_charset(mime: &str) -> String {
    if mime.starts_with("text/") && !mime.contains("charset") {
        format!("{}; charset=utf-8", mime)
    } else {
        mime.to_string()
    }
}
