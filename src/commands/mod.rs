//! Command implementations

mod control;
mod load;

pub use control::{run_pause, run_status, run_stop};
pub use load::run_load;
