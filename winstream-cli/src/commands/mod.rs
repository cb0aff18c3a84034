//! CLI command implementations

mod config;
mod list;
mod serve;

pub use config::{config, ConfigArgs};
pub use list::{list, ListArgs};
pub use serve::{serve, ServeArgs};
