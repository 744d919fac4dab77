pub mod config;
pub mod constants;

pub use config::{AmbiguityPolicy, LocatorConfig, PrepConfig, SplitConfig};
