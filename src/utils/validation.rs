use crate::services::naming;
use mime::Mime;
use thiserror::Error;

/// Image extensions accepted by every variant.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Document extensions accepted when PDF support is enabled.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

#[derive(Error, Debug, Clone)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

/// Extension and MIME gate for uploads and listings.
///
/// Both the declared MIME subtype and the filename extension must name an
/// accepted type; they are checked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedTypes {
    allow_pdf: bool,
}

impl AcceptedTypes {
    pub fn new(allow_pdf: bool) -> Self {
        Self { allow_pdf }
    }

    pub fn images_only() -> Self {
        Self::new(false)
    }

    pub fn images_and_pdf() -> Self {
        Self::new(true)
    }

    pub fn allows_pdf(&self) -> bool {
        self.allow_pdf
    }

    fn accepts_token(&self, token: &str) -> bool {
        let token = token.to_ascii_lowercase();
        IMAGE_EXTENSIONS.contains(&token.as_str())
            || (self.allow_pdf && DOCUMENT_EXTENSIONS.contains(&token.as_str()))
    }

    /// True when `filename` ends in an accepted extension (case-insensitive).
    pub fn accepts_filename(&self, filename: &str) -> bool {
        match naming::extension(filename).strip_prefix('.') {
            Some(ext) if !ext.is_empty() => self.accepts_token(ext),
            _ => false,
        }
    }

    /// Listing filter: any directory entry whose name ends in `.<accepted>`,
    /// dotfiles such as `.png` included.
    pub fn accepts_listed_name(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => self.accepts_token(ext),
            _ => false,
        }
    }

    /// True when the declared content type's subtype is an accepted token,
    /// e.g. `image/jpeg` or `application/pdf; charset=binary`.
    pub fn accepts_mime(&self, content_type: &str) -> bool {
        content_type
            .trim()
            .parse::<Mime>()
            .map(|m| self.accepts_token(m.subtype().as_str()))
            .unwrap_or(false)
    }

    /// Accept/reject decision for an incoming file part. Runs before any
    /// bytes are written.
    pub fn check_upload(
        &self,
        original_filename: &str,
        content_type: Option<&str>,
    ) -> Result<(), ValidationError> {
        let content_type = content_type.unwrap_or("application/octet-stream");
        if !self.accepts_mime(content_type) {
            return Err(ValidationError {
                code: "INVALID_MIME_TYPE",
                message: format!("MIME type '{}' is not allowed", content_type),
            });
        }

        if !self.accepts_filename(original_filename) {
            return Err(ValidationError {
                code: "INVALID_EXTENSION",
                message: format!(
                    "Extension '{}' is not allowed",
                    naming::extension(original_filename)
                ),
            });
        }

        Ok(())
    }

    /// Client-facing message for a rejected upload.
    pub fn rejection_message(&self) -> &'static str {
        if self.allow_pdf {
            "Error: Solo se permiten imágenes y PDF"
        } else {
            "Error: Solo se permiten imágenes"
        }
    }
}

impl Default for AcceptedTypes {
    fn default() -> Self {
        Self::images_and_pdf()
    }
}

/// A name requested through the detail endpoint must address a direct child
/// of the storage directory.
pub fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        tracing::warn!("Path traversal attempt detected: {}", name);
        return false;
    }
    true
}
