pub mod app;
pub mod cli;
pub mod config;
pub mod markup;
pub mod notes;
pub mod persist;
pub mod storage;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
