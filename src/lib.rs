pub mod config;
pub mod db;
pub mod fetch;
pub mod logging;
pub mod process;

pub use config::{Config, DatabaseConfig};
