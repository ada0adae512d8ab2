use std::sync::{Arc, Mutex};

use npmime::{
    plain_text_detector, Detector, MimeError, MimeErrorKind, MimeHierarchy, MimeNode, MimeRegistry,
    MimeResult, SystemDatabaseConfig, HTML_MIME_TYPE, MARKDOWN_MIME_TYPE, TEXT_MIME_TYPE,
};

fn registry() -> MimeRegistry {
    MimeRegistry::builder()
        .system_config(SystemDatabaseConfig::builtin_only())
        .build()
}

/// Records `extend` calls and keeps a small tree so parent walks work.
struct RecordingHierarchy {
    root: Arc<MimeNode>,
    extended: Mutex<Vec<(String, String, String)>>,
    fail: bool,
}

impl RecordingHierarchy {
    fn new(fail: bool) -> Self {
        let root = MimeNode::root("application/octet-stream", "", Arc::new(|_: &[u8], _: u32| true));
        root.extend(Arc::new(|_: &[u8], _: u32| true), TEXT_MIME_TYPE, ".txt");
        Self {
            root,
            extended: Mutex::new(Vec::new()),
            fail,
        }
    }
}

impl MimeHierarchy for RecordingHierarchy {
    fn lookup(&self, mime: &str) -> Option<Arc<MimeNode>> {
        self.root.find(mime)
    }

    fn extend(&self, parent: &str, detector: Detector, mime: &str, extension: &str) -> MimeResult<()> {
        if self.fail {
            return Err(MimeError::new(MimeErrorKind::Failed, "hierarchy is read-only"));
        }
        self.extended
            .lock()
            .unwrap()
            .push((parent.to_string(), mime.to_string(), extension.to_string()));
        self.root.find(parent).unwrap().extend(detector, mime, extension);
        Ok(())
    }

    fn detect(&self, raw: &[u8]) -> Arc<MimeNode> {
        self.root.detect(raw, self.read_limit())
    }
}

#[test]
fn test_defaults() {
    let reg = registry();
    assert_eq!(reg.get_extension("txt").as_deref(), Some("text/plain; charset=utf-8"));
    assert_eq!(reg.get_extension("js").as_deref(), Some("text/javascript; charset=utf-8"));
    assert_eq!(reg.get_extension("njn").as_deref(), Some("text/enjin; charset=utf-8"));
    assert_eq!(reg.get_extension("org").as_deref(), Some("text/org-mode; charset=utf-8"));
    assert_eq!(reg.get_extension("md").as_deref(), Some("text/markdown; charset=utf-8"));
    assert_eq!(reg.get_extension("zip").as_deref(), Some("application/zip"));
    assert_eq!(reg.get_charset(MARKDOWN_MIME_TYPE).as_deref(), Some("utf-8"));
}

#[test]
fn test_unseeded() {
    let reg = MimeRegistry::builder()
        .system_config(SystemDatabaseConfig::builtin_only())
        .seed(false)
        .build();
    assert_eq!(reg.get_charset(TEXT_MIME_TYPE), None);
    assert_eq!(reg.get_extension("njn"), None);
    // the static table still answers
    assert_eq!(reg.get_extension("txt").as_deref(), Some("text/plain; charset=utf-8"));
}

#[test]
fn test_dot_stripping() {
    let reg = registry();
    for ext in ["md", "html", "zip", "not-a-thing"] {
        assert_eq!(reg.get_extension(ext), reg.get_extension(&format!(".{}", ext)));
    }
    reg.set_extension(".dotted", "application/x-dotted");
    assert_eq!(reg.get_extension("dotted").as_deref(), Some("application/x-dotted"));
}

#[test]
fn test_set_extension_clears_override() {
    let reg = registry();
    assert_eq!(reg.get_extension("not-a-thing"), None);
    reg.set_extension("not-a-thing", "application/nope");
    assert_eq!(reg.get_extension("not-a-thing").as_deref(), Some("application/nope"));
    reg.set_extension("not-a-thing", "");
    assert_eq!(reg.get_extension("not-a-thing"), None);

    // clearing a seeded override falls back to the system database
    reg.set_extension("html", "");
    assert_eq!(reg.get_extension("html").as_deref(), Some("text/html; charset=utf-8"));
}

#[test]
fn test_charsets() {
    let reg = registry();
    assert_eq!(reg.get_charset("nope/nope"), None);
    reg.set_charset("nope/nope; charset=latin1", "utf-8");
    assert_eq!(reg.get_charset("nope/nope").as_deref(), Some("utf-8"));
    assert_eq!(reg.get_charset("nope/nope; charset=whatever").as_deref(), Some("utf-8"));
    reg.set_charset("nope/nope", "");
    assert_eq!(reg.get_charset("nope/nope"), None);
}

#[test]
fn test_register_text_type_errors() {
    let reg = registry();
    assert_eq!(reg.register_text_type("", "md", None).unwrap_err().kind(), MimeErrorKind::InvalidArg);
    assert_eq!(reg.register_text_type("text/x", "", None).unwrap_err().kind(), MimeErrorKind::InvalidArg);
    assert_eq!(reg.register_text_type("text/x", ".", None).unwrap_err().kind(), MimeErrorKind::InvalidArg);
    assert_eq!(
        reg.register_text_type("bad mime no slash", "ext", None).unwrap_err().kind(),
        MimeErrorKind::Parse
    );
}

#[test]
fn test_register_text_type() {
    let reg = registry();
    reg.register_text_type("text/custom", ".cst", None).unwrap();

    assert_eq!(reg.get_extension("cst").as_deref(), Some("text/custom; charset=utf-8"));
    assert_eq!(reg.get_charset("text/custom").as_deref(), Some("utf-8"));
    assert!(reg.is_plain_text("text/custom"));

    for key in ["text/custom", "text/custom; charset=utf-8"] {
        let node = reg.hierarchy().lookup(key).unwrap();
        assert!(node.parent().unwrap().is(TEXT_MIME_TYPE));
        assert_eq!(node.extension(), ".cst");
    }

    // the system database keeps the association after the override is cleared
    reg.set_extension("cst", "");
    assert_eq!(reg.get_extension("cst").as_deref(), Some("text/custom; charset=utf-8"));
}

#[test]
fn test_register_text_type_forces_utf8() {
    let reg = registry();
    reg.register_text_type("Text/Legacy; charset=latin1; flavor=old", "lgc", None).unwrap();
    assert_eq!(
        reg.get_extension("lgc").as_deref(),
        Some("text/legacy; charset=utf-8; flavor=old")
    );
    assert_eq!(reg.get_charset("text/legacy").as_deref(), Some("utf-8"));
}

#[test]
fn test_register_text_type_with_fake_hierarchy() {
    let fake = Arc::new(RecordingHierarchy::new(false));
    let reg = MimeRegistry::builder()
        .system_config(SystemDatabaseConfig::builtin_only())
        .hierarchy(fake.clone())
        .seed(false)
        .build();

    reg.register_text_type("good/mime", "good", Some(Arc::new(|_: &[u8], _: u32| false)))
        .unwrap();

    let extended = fake.extended.lock().unwrap().clone();
    assert_eq!(
        extended,
        vec![
            (TEXT_MIME_TYPE.to_string(), "good/mime".to_string(), ".good".to_string()),
            (TEXT_MIME_TYPE.to_string(), "good/mime; charset=utf-8".to_string(), ".good".to_string()),
        ]
    );
    // the custom detector never matches, so content stays text/plain
    assert_eq!(reg.detect_bytes(b"anything"), TEXT_MIME_TYPE);
}

#[test]
fn test_register_text_type_partial_failure() {
    let reg = MimeRegistry::builder()
        .system_config(SystemDatabaseConfig::builtin_only())
        .hierarchy(Arc::new(RecordingHierarchy::new(true)))
        .seed(false)
        .build();

    let err = reg.register_text_type("text/partial", "prt", None).unwrap_err();
    assert_eq!(err.kind(), MimeErrorKind::Failed);
    // earlier steps are kept
    assert_eq!(reg.get_extension("prt").as_deref(), Some("text/partial; charset=utf-8"));
    assert_eq!(reg.get_charset("text/partial").as_deref(), Some("utf-8"));
}

#[test]
fn test_is_plain_text() {
    let reg = registry();
    assert!(reg.is_plain_text("text/enjin"));
    assert!(reg.is_plain_text("text/org-mode"));
    assert!(reg.is_plain_text("text/markdown; charset=utf-8"));
    assert!(!reg.is_plain_text("application/zip"));
    assert!(!reg.is_plain_text(""));
    assert!(!reg.is_plain_text("garbage"));

    // without registered charsets the hierarchy decides
    reg.set_charset(TEXT_MIME_TYPE, "");
    assert!(reg.is_plain_text(TEXT_MIME_TYPE));
    reg.set_charset(HTML_MIME_TYPE, "");
    assert!(reg.is_plain_text(HTML_MIME_TYPE));
    assert!(reg.is_plain_text("application/xml"));
}

#[test]
fn test_from_path_only() {
    let reg = registry();
    assert_eq!(reg.from_path_only("file.txt"), "text/plain; charset=utf-8");
    assert_eq!(reg.from_path_only("file.html.tmpl"), "text/html; charset=utf-8");
    assert_eq!(reg.from_path_only("file.html.tmpl"), reg.get_extension("html").unwrap());
    assert_eq!(reg.from_path_only("dir/notes.md"), "text/markdown; charset=utf-8");
    assert_eq!(reg.from_path_only(""), "");
    assert_eq!(reg.from_path_only("LICENSE"), "");
    assert_eq!(reg.from_path_only("unknown.not-a-thing"), "");
}

#[test]
fn test_plain_text_detector() {
    assert!(plain_text_detector(b"plain text", 1024));
    assert!(plain_text_detector(&[0, 1, 2], 0));
}

#[test]
fn test_charset_keys_tolerate_loose_media_types() {
    let reg = registry();
    assert_eq!(reg.get_charset("text/html ; charset=utf-8").as_deref(), Some("utf-8"));
    assert_eq!(reg.get_charset("text/html; foo").as_deref(), Some("utf-8"));
    assert!(reg.is_plain_text("text/html ; charset=utf-8"));
    assert!(reg.is_plain_text("text/markdown;charset=utf-8;"));

    // a malformed parameter never collapses onto the empty key
    reg.set_charset("application/x-loose; foo", "latin1");
    assert_eq!(reg.get_charset("application/x-loose").as_deref(), Some("latin1"));
    assert_eq!(reg.get_charset(""), None);
}

#[test]
fn test_register_text_type_rejects_bad_parameters() {
    let reg = registry();
    let err = reg.register_text_type("text/x-loose; foo", "lse", None).unwrap_err();
    assert_eq!(err.kind(), MimeErrorKind::Parse);
    assert_eq!(reg.get_extension("lse"), None);

    // whitespace around the separator is fine
    reg.register_text_type("text/x-spaced ; flavor=wide", "spc", None).unwrap();
    assert_eq!(
        reg.get_extension("spc").as_deref(),
        Some("text/x-spaced; charset=utf-8; flavor=wide")
    );
}
