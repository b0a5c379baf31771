pub mod cooldown;
pub mod shutdown;

pub use cooldown::{Cooldown, RunnerState, SuspendOutcome};
pub use shutdown::install_ctrl_c_handler;
