pub mod config;
pub mod dashboard;

pub use config::Config;
pub use dashboard::*;
