use serde::Serialize;
use utoipa::ToSchema;

/// Multipart field carrying the file.
pub const FILE_FIELD: &str = "foto";

/// Optional multipart field carrying the display name.
pub const NAME_FIELD: &str = "fullname";

/// Multipart body of `POST /api/subir`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    /// Image, or PDF when enabled
    #[schema(value_type = String, format = Binary)]
    pub foto: Vec<u8>,
    /// Custom name; sanitized to `[A-Za-z0-9_-]`, extension kept from the file
    pub fullname: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub mensaje: String,
    pub archivo: String,
    pub nombre_usado: String,
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct FileEntry {
    pub nombre: String,
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct FileDetailResponse {
    pub nombre: String,
    pub url: String,
    pub path_local: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn saved_message(allow_pdf: bool) -> &'static str {
    if allow_pdf {
        "Archivo guardado con éxito"
    } else {
        "Imagen guardada con éxito"
    }
}

pub fn not_found_message(allow_pdf: bool) -> &'static str {
    if allow_pdf {
        "El archivo no existe"
    } else {
        "La imagen no existe"
    }
}
