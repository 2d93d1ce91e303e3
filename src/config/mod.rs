//! Machine schema, settings and the OS catalog

pub mod catalog;
pub mod schema;
pub mod settings;
