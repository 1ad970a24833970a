//! Tasks spawned next to the HTTP server.
//!
//! Each runs until its `CancellationToken` fires; `main.rs` cancels them after
//! the server stops and waits up to the shutdown timeout.

pub mod staged_copy_sweep;
