pub mod urls;
pub mod validation;
