//! Content sniffing hierarchy.
//!
//! MIME types form a tree rooted at `application/octet-stream`. Every node
//! carries a detector; detection walks down from the root, descending into the
//! first child whose detector accepts the content. Registries only depend on the
//! [`MimeHierarchy`] trait, the default implementation is [`sniff::SniffTree`].

pub mod sniff;

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::charset::prune_charset;
use crate::error::{MimeError, MimeErrorKind, MimeResult};

/// Content detection predicate: raw bytes and the read limit they were taken with.
pub type Detector = Arc<dyn Fn(&[u8], u32) -> bool + Send + Sync>;

/// Number of leading bytes read from a file for detection.
pub const DEFAULT_READ_LIMIT: u32 = 3072;

/// Trait implemented by content sniffing hierarchies.
pub trait MimeHierarchy: Send + Sync {
    /// Finds the node for `mime`, ignoring parameters.
    fn lookup(&self, mime: &str) -> Option<Arc<MimeNode>>;

    /// Adds `mime` as a child of `parent`.
    fn extend(&self, parent: &str, detector: Detector, mime: &str, extension: &str) -> MimeResult<()>;

    /// Detects the most specific node matching `raw`.
    fn detect(&self, raw: &[u8]) -> Arc<MimeNode>;

    fn read_limit(&self) -> u32 {
        DEFAULT_READ_LIMIT
    }

    /// Reads at most [`read_limit`](Self::read_limit) bytes of `path` and detects them.
    fn detect_file(&self, path: &Path) -> MimeResult<Arc<MimeNode>> {
        let file = std::fs::File::open(path)?;
        let mut raw = Vec::with_capacity(self.read_limit() as usize);
        file.take(self.read_limit() as u64).read_to_end(&mut raw)?;
        Ok(self.detect(&raw))
    }
}

/// A MIME type within a hierarchy.
pub struct MimeNode {
    mime: String,
    essence: String,
    extension: String,
    aliases: Vec<String>,
    detector: Detector,
    parent: Weak<MimeNode>,
    children: RwLock<Vec<Arc<MimeNode>>>,
}

impl MimeNode {
    /// Creates a parentless node, typically the root of a hierarchy.
    pub fn root(mime: &str, extension: &str, detector: Detector) -> Arc<Self> {
        Arc::new(Self::build(mime, extension, &[], detector, Weak::new()))
    }

    fn build(mime: &str, extension: &str, aliases: &[&str], detector: Detector, parent: Weak<MimeNode>) -> Self {
        let essence = match prune_charset(mime) {
            pruned if pruned.is_empty() => mime.trim().to_ascii_lowercase(),
            pruned => pruned,
        };
        Self {
            mime: mime.to_string(),
            essence,
            extension: extension.to_string(),
            aliases: aliases.iter().map(|a| a.to_ascii_lowercase()).collect(),
            detector,
            parent,
            children: RwLock::new(Vec::new()),
        }
    }

    /// Adds a child node consulted before any existing children.
    pub fn extend(self: &Arc<Self>, detector: Detector, mime: &str, extension: &str) -> Arc<MimeNode> {
        self.extend_with_aliases(detector, mime, extension, &[])
    }

    pub fn extend_with_aliases(
        self: &Arc<Self>,
        detector: Detector,
        mime: &str,
        extension: &str,
        aliases: &[&str],
    ) -> Arc<MimeNode> {
        let child = Arc::new(Self::build(mime, extension, aliases, detector, Arc::downgrade(self)));
        self.write_children().insert(0, child.clone());
        child
    }

    /// Full MIME string, including any parameters it was registered with.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Dotted file extension, empty when the type has none.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn parent(&self) -> Option<Arc<MimeNode>> {
        self.parent.upgrade()
    }

    pub fn children(&self) -> Vec<Arc<MimeNode>> {
        self.read_children().clone()
    }

    /// Whether `candidate` names this type or one of its aliases, ignoring parameters.
    pub fn is(&self, candidate: &str) -> bool {
        let candidate = prune_charset(candidate);
        if candidate.is_empty() {
            return false;
        }
        self.essence == candidate || self.aliases.iter().any(|a| *a == candidate)
    }

    /// Whether this node or one of its ancestors is `mime`.
    pub fn is_descendant_of(&self, mime: &str) -> bool {
        if self.is(mime) {
            return true;
        }
        let mut check = self.parent();
        while let Some(node) = check {
            if node.is(mime) {
                return true;
            }
            check = node.parent();
        }
        false
    }

    pub fn matches(&self, raw: &[u8], limit: u32) -> bool {
        (self.detector)(raw, limit)
    }

    /// Depth-first search for the node named `mime`.
    pub fn find(self: &Arc<Self>, mime: &str) -> Option<Arc<MimeNode>> {
        if self.is(mime) {
            return Some(self.clone());
        }
        self.read_children().iter().find_map(|child| child.find(mime))
    }

    /// Descends from this node into the first matching child at each level.
    pub fn detect(self: &Arc<Self>, raw: &[u8], limit: u32) -> Arc<MimeNode> {
        let matched = self
            .read_children()
            .iter()
            .find(|child| child.matches(raw, limit))
            .cloned();
        match matched {
            Some(child) => child.detect(raw, limit),
            None => self.clone(),
        }
    }

    fn read_children(&self) -> RwLockReadGuard<'_, Vec<Arc<MimeNode>>> {
        match self.children.read() {
            Ok(guard) => guard,
            Err(e) => {
                log::warn!("Recovering poisoned children lock of {}: {}", self.mime, e);
                e.into_inner()
            }
        }
    }

    fn write_children(&self) -> RwLockWriteGuard<'_, Vec<Arc<MimeNode>>> {
        match self.children.write() {
            Ok(guard) => guard,
            Err(e) => {
                log::warn!("Recovering poisoned children lock of {}: {}", self.mime, e);
                e.into_inner()
            }
        }
    }
}

impl fmt::Debug for MimeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MimeNode")
            .field("mime", &self.mime)
            .field("extension", &self.extension)
            .field("aliases", &self.aliases)
            .field("children", &self.read_children().len())
            .finish()
    }
}

impl fmt::Display for MimeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mime)
    }
}

/// Looks up `parent` in a tree rooted at `root` and extends it.
pub(crate) fn extend_tree(
    root: &Arc<MimeNode>,
    parent: &str,
    detector: Detector,
    mime: &str,
    extension: &str,
) -> MimeResult<()> {
    let node = root.find(parent).ok_or_else(|| {
        MimeError::new(MimeErrorKind::NotFound, format!("unknown parent MIME type {:?}", parent))
    })?;
    log::debug!("Extending {} with {} ({})", node.mime(), mime, extension);
    node.extend(detector, mime, extension);
    Ok(())
}
