//! # npmime - Nepsod MIME
//!
//! MIME type resolution for files, extensions and raw content, with runtime
//! registration of extension, MIME type and charset associations.
//!
//! ## Overview
//!
//! - **Extensions**: `md` → `text/markdown; charset=utf-8`. Registered
//!   associations win; otherwise the system MIME database answers (shared-mime-info
//!   `globs2`, `mime.types`, then the `mime_guess` table).
//! - **Charsets**: `text/markdown` → `utf-8`, keyed by the bare media type.
//! - **Text types**: [`register_text_type`] registers both at once and extends the
//!   content sniffing hierarchy below `text/plain`.
//! - **Paths**: [`mime`] resolves directories, extensions (`page.html.tmpl` counts
//!   as `html`) and finally file content.
//!
//! Every operation is available on an explicit [`MimeRegistry`] and as a free
//! function using the process-wide default registry.
//!
//! ## Example
//!
//! ```no_run
//! use npmime::{get_extension, is_plain_text, mime, register_text_type};
//!
//! # fn example() -> npmime::MimeResult<()> {
//! register_text_type("text/x-gemini", "gmi", None)?;
//! assert_eq!(get_extension(".gmi").as_deref(), Some("text/x-gemini; charset=utf-8"));
//! assert!(is_plain_text("text/x-gemini"));
//!
//! println!("README: {}", mime("./README.md"));
//! # Ok(())
//! # }
//! ```

pub mod charset;
pub mod error;
pub mod hierarchy;
pub mod lookup;
pub mod path;
pub mod registry;
pub mod system;

pub const TEXT_MIME_TYPE: &str = "text/plain";
pub const HTML_MIME_TYPE: &str = "text/html";
pub const CSS_MIME_TYPE: &str = "text/css";
pub const SCSS_MIME_TYPE: &str = "text/x-scss";
pub const JSON_MIME_TYPE: &str = "application/json";
pub const JAVASCRIPT_MIME_TYPE: &str = "text/javascript";
pub const BINARY_MIME_TYPE: &str = "application/octet-stream";

/// MIME type reported for filesystem directories.
pub const DIRECTORY_MIME_TYPE: &str = "inode/directory";
/// The Go-Enjin `njn` page format.
pub const ENJIN_MIME_TYPE: &str = "text/enjin";
/// Emacs org-mode documents.
pub const ORG_MODE_MIME_TYPE: &str = "text/org-mode";
pub const MARKDOWN_MIME_TYPE: &str = "text/markdown";

pub const ENJIN_EXTENSION: &str = "njn";
pub const ORG_MODE_EXTENSION: &str = "org";
pub const MARKDOWN_EXTENSION: &str = "md";

pub use charset::{format_media_type, parse_media_type, prune_charset};
pub use error::{MimeError, MimeErrorKind, MimeResult};
pub use hierarchy::sniff::SniffTree;
pub use hierarchy::{Detector, MimeHierarchy, MimeNode};
pub use lookup::Lookup;
pub use path::split_extensions;
pub use registry::{
    from_path_only, get_charset, get_extension, global, is_plain_text, mime, mime_async,
    plain_text_detector, register_text_type, set_charset, set_extension, MimeRegistry,
    MimeRegistryBuilder,
};
pub use system::{SystemDatabase, SystemDatabaseConfig};
