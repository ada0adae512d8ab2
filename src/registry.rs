//! Extension and charset registries.
//!
//! A [`MimeRegistry`] owns two association tables (extension to MIME type and
//! MIME type to charset) and resolves paths and content on top of them, falling
//! back to a [`SystemDatabase`] for extensions and a [`MimeHierarchy`] for
//! content. The process-wide default registry is available through [`global`]
//! and the free functions in this module.

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::io::AsyncReadExt;

use crate::charset::{format_media_type, parse_media_type, prune_charset};
use crate::error::{MimeError, MimeErrorKind, MimeResult};
use crate::hierarchy::sniff::SniffTree;
use crate::hierarchy::{Detector, MimeHierarchy};
use crate::lookup::Lookup;
use crate::path::{is_dir, is_file, split_extensions};
use crate::system::{SystemDatabase, SystemDatabaseConfig};
use crate::{
    CSS_MIME_TYPE, DIRECTORY_MIME_TYPE, ENJIN_EXTENSION, ENJIN_MIME_TYPE, HTML_MIME_TYPE,
    JAVASCRIPT_MIME_TYPE, JSON_MIME_TYPE, MARKDOWN_EXTENSION, MARKDOWN_MIME_TYPE,
    ORG_MODE_EXTENSION, ORG_MODE_MIME_TYPE, SCSS_MIME_TYPE, TEXT_MIME_TYPE,
};

/// Extension marking a template, `page.html.tmpl` resolves as `html`.
const TEMPLATE_EXTENSION: &str = "tmpl";

const UTF8: &str = "utf-8";

const DEFAULT_EXTENSIONS: &[(&str, &str)] = &[
    ("txt", TEXT_MIME_TYPE),
    ("html", HTML_MIME_TYPE),
    ("css", CSS_MIME_TYPE),
    ("scss", SCSS_MIME_TYPE),
    ("json", JSON_MIME_TYPE),
    ("js", JAVASCRIPT_MIME_TYPE),
];

const DEFAULT_CHARSETS: &[&str] = &[
    TEXT_MIME_TYPE,
    HTML_MIME_TYPE,
    CSS_MIME_TYPE,
    SCSS_MIME_TYPE,
    JSON_MIME_TYPE,
    JAVASCRIPT_MIME_TYPE,
    ENJIN_MIME_TYPE,
    ORG_MODE_MIME_TYPE,
    MARKDOWN_MIME_TYPE,
];

const STARTUP_TEXT_TYPES: &[(&str, &str)] = &[
    (ENJIN_MIME_TYPE, ENJIN_EXTENSION),
    (ORG_MODE_MIME_TYPE, ORG_MODE_EXTENSION),
    (MARKDOWN_MIME_TYPE, MARKDOWN_EXTENSION),
];

/// Default detector for [`MimeRegistry::register_text_type`].
///
/// Accepts any content. This means content sniffing cannot tell registered text
/// types apart from each other or from `text/plain`; an extension-less text
/// file sniffs as the most recently registered text type.
pub fn plain_text_detector(_raw: &[u8], _limit: u32) -> bool {
    true
}

pub struct MimeRegistry {
    extensions: Lookup,
    charsets: Lookup,
    system: Arc<SystemDatabase>,
    hierarchy: Arc<dyn MimeHierarchy>,
}

impl MimeRegistry {
    /// Creates a registry seeded with the default associations, backed by the
    /// system MIME files and a private [`SniffTree`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MimeRegistryBuilder {
        MimeRegistryBuilder::default()
    }

    pub fn system(&self) -> &Arc<SystemDatabase> {
        &self.system
    }

    pub fn hierarchy(&self) -> &Arc<dyn MimeHierarchy> {
        &self.hierarchy
    }

    /// Returns the MIME type associated with `extension` (leading dot optional),
    /// consulting the system database when no association was set.
    pub fn get_extension(&self, extension: &str) -> Option<String> {
        let extension = trim_dot(extension);
        if let Some(mime) = self.extensions.get(extension) {
            return Some(mime);
        }
        self.system.lookup_by_extension(&format!(".{}", extension))
    }

    /// Associates `extension` with `mime`, overwriting any previous association.
    /// An empty `mime` clears it.
    pub fn set_extension(&self, extension: &str, mime: &str) {
        let extension = trim_dot(extension);
        if mime.is_empty() {
            self.extensions.unset(extension);
            return;
        }
        self.extensions.set(extension, mime);
    }

    /// Returns the charset registered for `mime`, ignoring its parameters.
    pub fn get_charset(&self, mime: &str) -> Option<String> {
        self.charsets.get(&prune_charset(mime))
    }

    /// Registers `charset` for `mime`, ignoring its parameters. An empty
    /// `charset` clears it.
    pub fn set_charset(&self, mime: &str, charset: &str) {
        let mime = prune_charset(mime);
        if charset.is_empty() {
            self.charsets.unset(&mime);
            return;
        }
        self.charsets.set(mime, charset);
    }

    /// Registers `mime` as a UTF-8 text type for `extension`.
    ///
    /// The extension is associated with `mime; charset=utf-8`, the bare type
    /// gets the `utf-8` charset, and both forms are added to the hierarchy as
    /// children of `text/plain` using `detector` (or [`plain_text_detector`]).
    /// Steps are applied in order and are not rolled back if a later one fails.
    pub fn register_text_type(
        &self,
        mime: &str,
        extension: &str,
        detector: Option<Detector>,
    ) -> MimeResult<()> {
        let extension = trim_dot(extension);
        if mime.is_empty() || extension.is_empty() {
            return Err(MimeError::new(
                MimeErrorKind::InvalidArg,
                "mime and extension arguments must not be empty",
            ));
        }

        let (base, mut params) = parse_media_type(mime)?;
        params.insert("charset".to_string(), UTF8.to_string());
        let full_mime = format_media_type(&base, &params);
        if full_mime.is_empty() {
            return Err(MimeError::new(
                MimeErrorKind::Parse,
                format!("cannot format media type {:?}", mime),
            ));
        }

        self.set_extension(extension, &full_mime);
        self.set_charset(&base, UTF8);

        let detector: Detector = match detector {
            Some(detector) => detector,
            None => Arc::new(plain_text_detector),
        };
        let dotted = format!(".{}", extension);
        for key in [&base, &full_mime] {
            self.hierarchy.extend(TEXT_MIME_TYPE, detector.clone(), key, &dotted)?;
        }

        self.system.add_extension_type(&dotted, &base)?;
        log::debug!("Registered text type {} for {}", full_mime, dotted);
        Ok(())
    }

    /// Whether `mime` is plain text: either it has a registered charset, or it
    /// is `text/plain` or a descendant of it in the hierarchy.
    pub fn is_plain_text(&self, mime: &str) -> bool {
        let mime = prune_charset(mime);
        if self.charsets.contains(&mime) {
            return true;
        }
        self.hierarchy
            .lookup(&mime)
            .map(|node| node.is_descendant_of(TEXT_MIME_TYPE))
            .unwrap_or(false)
    }

    /// Resolves `path` by its extension only. A trailing `tmpl` extension defers
    /// to the one before it.
    pub fn from_path_only(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return String::new();
        }

        let (first, second) = split_extensions(path);
        let extension = if first == TEMPLATE_EXTENSION && !second.is_empty() {
            second
        } else {
            first
        };
        if extension.is_empty() {
            return String::new();
        }
        self.get_extension(&extension).unwrap_or_default()
    }

    /// Returns the MIME type of a local directory or file.
    ///
    /// Directories yield [`DIRECTORY_MIME_TYPE`]. Files resolve by extension
    /// first and by content otherwise. Anything else yields an empty string.
    pub fn mime(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        if is_dir(path) {
            return DIRECTORY_MIME_TYPE.to_string();
        }
        if !is_file(path) {
            return String::new();
        }

        let mime = self.from_path_only(path);
        if !mime.is_empty() {
            return mime;
        }
        match self.hierarchy.detect_file(path) {
            Ok(node) => node.mime().to_string(),
            Err(e) => {
                log::debug!("Content detection failed for {}: {}", path.display(), e);
                String::new()
            }
        }
    }

    /// Async version of [`mime`](Self::mime) using `tokio::fs`.
    pub async fn mime_async(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(_) => return String::new(),
        };
        if metadata.is_dir() {
            return DIRECTORY_MIME_TYPE.to_string();
        }
        if !metadata.is_file() {
            return String::new();
        }

        let mime = self.from_path_only(path);
        if !mime.is_empty() {
            return mime;
        }
        match self.read_head(path).await {
            Ok(raw) => self.hierarchy.detect(&raw).mime().to_string(),
            Err(e) => {
                log::debug!("Content detection failed for {}: {}", path.display(), e);
                String::new()
            }
        }
    }

    /// Detects the MIME type of in-memory content.
    pub fn detect_bytes(&self, raw: &[u8]) -> String {
        self.hierarchy.detect(raw).mime().to_string()
    }

    async fn read_head(&self, path: &Path) -> MimeResult<Vec<u8>> {
        let limit = self.hierarchy.read_limit();
        let file = tokio::fs::File::open(path).await?;
        let mut raw = Vec::with_capacity(limit as usize);
        file.take(limit as u64).read_to_end(&mut raw).await?;
        Ok(raw)
    }
}

impl Default for MimeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a [`MimeRegistry`] with a chosen system database and hierarchy.
pub struct MimeRegistryBuilder {
    system: Option<Arc<SystemDatabase>>,
    system_config: SystemDatabaseConfig,
    hierarchy: Option<Arc<dyn MimeHierarchy>>,
    seed: bool,
}

impl Default for MimeRegistryBuilder {
    fn default() -> Self {
        Self {
            system: None,
            system_config: SystemDatabaseConfig::default(),
            hierarchy: None,
            seed: true,
        }
    }
}

impl MimeRegistryBuilder {
    /// Shares an existing system database.
    pub fn system(mut self, system: Arc<SystemDatabase>) -> Self {
        self.system = Some(system);
        self
    }

    /// Configuration for a new system database, ignored if [`system`](Self::system) is set.
    pub fn system_config(mut self, config: SystemDatabaseConfig) -> Self {
        self.system_config = config;
        self
    }

    pub fn hierarchy(mut self, hierarchy: Arc<dyn MimeHierarchy>) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    /// Whether to seed the default associations and text types (on by default).
    pub fn seed(mut self, seed: bool) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> MimeRegistry {
        let system = self
            .system
            .unwrap_or_else(|| Arc::new(SystemDatabase::with_config(&self.system_config)));
        let hierarchy: Arc<dyn MimeHierarchy> = match self.hierarchy {
            Some(hierarchy) => hierarchy,
            None => Arc::new(SniffTree::new()),
        };

        if !self.seed {
            return MimeRegistry {
                extensions: Lookup::new(),
                charsets: Lookup::new(),
                system,
                hierarchy,
            };
        }

        let registry = MimeRegistry {
            extensions: Lookup::with_entries(
                DEFAULT_EXTENSIONS
                    .iter()
                    .map(|(ext, mime)| (*ext, format!("{}; charset={}", mime, UTF8))),
            ),
            charsets: Lookup::with_entries(DEFAULT_CHARSETS.iter().map(|mime| (*mime, UTF8))),
            system,
            hierarchy,
        };

        for (mime, extension) in STARTUP_TEXT_TYPES {
            if let Err(e) = registry.register_text_type(mime, extension, None) {
                log::warn!("Failed to register text type {} (.{}): {}", mime, extension, e);
            }
        }

        registry
    }
}

fn trim_dot(extension: &str) -> &str {
    extension.strip_prefix('.').unwrap_or(extension)
}

static GLOBAL: Lazy<MimeRegistry> = Lazy::new(MimeRegistry::new);

/// The process-wide registry, created on first use.
pub fn global() -> &'static MimeRegistry {
    &GLOBAL
}

pub fn get_extension(extension: &str) -> Option<String> {
    global().get_extension(extension)
}

pub fn set_extension(extension: &str, mime: &str) {
    global().set_extension(extension, mime)
}

pub fn get_charset(mime: &str) -> Option<String> {
    global().get_charset(mime)
}

pub fn set_charset(mime: &str, charset: &str) {
    global().set_charset(mime, charset)
}

pub fn register_text_type(mime: &str, extension: &str, detector: Option<Detector>) -> MimeResult<()> {
    global().register_text_type(mime, extension, detector)
}

pub fn is_plain_text(mime: &str) -> bool {
    global().is_plain_text(mime)
}

pub fn from_path_only(path: impl AsRef<Path>) -> String {
    global().from_path_only(path)
}

pub fn mime(path: impl AsRef<Path>) -> String {
    global().mime(path)
}

pub async fn mime_async(path: impl AsRef<Path>) -> String {
    global().mime_async(path).await
}
