pub mod api;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod models;
pub mod query;
pub mod session;
pub mod task_list;
pub mod tui;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use models::{Priority, Task};
pub use utils::Profile;
