//! CLI command handlers, one file per command.

mod config;
mod docs;
mod fetch;
mod run;
mod stop;
mod version;

pub use config::run_config;
pub use docs::{run_completions, run_manpage};
pub use fetch::run_fetch;
pub use run::run_dispatch;
pub use stop::run_stop;
pub use test::run_test;
pub use version::run_version;
