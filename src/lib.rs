pub mod config;
pub mod manifest;
pub mod store;
pub mod version;
