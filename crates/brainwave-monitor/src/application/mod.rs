//! Application layer use cases for the monitor.
//!
//! # Sub-modules
//!
//! - **`monitor`** – The polling loop: drives a [`brainwave_core::Headset`],
//!   prints fresh readings, logs and counts rejected frames, and stops on
//!   end-of-stream, a reading limit, or a shutdown request.
//!
//! - **`output`** – Renders a [`brainwave_core::SensorState`] as CSV, JSON,
//!   or a human-readable debug block.
//!
//! Neither module opens files or sockets; the byte source and the writers
//! are injected by `main.rs`.

pub mod monitor;
pub mod output;
