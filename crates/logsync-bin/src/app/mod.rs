//! Agent application wiring.

mod lifecycle;
mod run;
mod status;

pub use run::{effective_log_level, run_agent};
pub use status::{print_config_check, print_status};
