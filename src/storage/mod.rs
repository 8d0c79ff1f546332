pub mod archive;
pub mod documents;
pub mod error;
pub mod retention;
pub mod scheduler;
pub mod settings;
pub mod validate;
