pub mod language;
pub mod metadata;
