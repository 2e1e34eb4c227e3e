//! Infrastructure layer for the monitor application.
//!
//! Contains OS-facing adapters: byte sources backed by device nodes, files,
//! stdin, and TCP sockets, plus file-system storage for the configuration.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `brainwave_core`, but MUST NOT be imported by the `application` layer.

pub mod byte_source;
pub mod storage;
