//! Machine persistence, registry and folder management

pub mod codec;
pub mod config;
pub mod creator;
pub mod directory;
pub mod manager;
pub mod registry;
