// Library root — exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod event;
pub mod metrics;
pub mod scheduler;
pub mod service;
pub mod services;
pub mod sources;

// These modules are only needed by the binary.
// Declared pub so integration tests can reach them if needed.
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
