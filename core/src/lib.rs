//! Core of `netwait`.
//!
//! * **[`waiter`]**: the bounded "wait until reachable" loop.
//! * **[`network`]**: the probe the waiter drives, and its classification.
//! * **[`container`]**: the container-runtime CI actions.

pub mod container;
pub mod network;
pub mod waiter;
