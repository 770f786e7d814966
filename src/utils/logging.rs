//! Module-gated logging macros for the sampling hot path.
//!
//! A module opts in by defining two constants, then calls the macros
//! exported at the crate root:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TARGET: &str = "studysync::sampling";
//!
//! use crate::{log_debug, log_info, log_warn};
//! log_info!("tick {} applied", n);
//! ```
//! Flipping `ENABLE_LOGS` silences one module without touching `RUST_LOG`.

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: LOG_TARGET, $($arg)*);
        }
    };
}
