//! Shared helpers for canvas-server integration tests.

mod server;

pub use server::TestServer;
