//! Shared models, errors and configuration for `netwait`.
//!
//! * **[`network`]**: the wait target and the validated wait request.
//! * **[`error`]**: probe classification and the failures a wait can end in.
//! * **[`config`]**: tunables shared between the waiter and the command line.

pub mod config;
pub mod error;
pub mod network;

#[doc(hidden)]
pub use tracing;

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::tracing::info!($($arg)*)
    };
}

/// Marks a completed step. Rendered differently from plain `info!` lines.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::tracing::info!(target: "netwait::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::tracing::error!($($arg)*)
    };
}
