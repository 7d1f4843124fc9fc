//! This module exports a minimal message-passing API, which is encapsulated
//! by a `Communicator` trait. Implementors only need to write tagged `send`
//! and `recv` operations and an `abort` notice for a given transport layer.
//! Two are included: threads of one process over channels, and a pure-Rust
//! TCP transport. The trait then provides default implementations for
//! broadcast, reduce, reduce-all and barrier operations.
//!

mod backoff;
pub mod comm;
pub mod local;
pub mod mailbox;
pub mod tcp;
pub mod util;

pub use comm::{Communicator, Tag};
pub use local::LocalCommunicator;
pub use tcp::TcpCommunicator;
