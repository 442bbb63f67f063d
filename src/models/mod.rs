use std::path::PathBuf;

/// How the stored filename was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Derived from the client-supplied `fullname` field.
    CustomNamed,
    /// Timestamp + random suffix prepended to the original filename.
    AutoNamed,
}

/// File part of an upload request, as declared by the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_filename: String,
    pub content_type: Option<String>,
}

/// A file that has been placed in the storage directory.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub stored_filename: String,
    pub absolute_path: PathBuf,
    pub source_kind: SourceKind,
    pub size: u64,
}
