pub mod list;
pub mod types;
pub mod upload;

// Re-export all types
pub use types::*;

// Re-export all handlers
pub use list::{get_file_detail, list_files};
pub use upload::upload_file;
