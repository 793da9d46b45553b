// The binary in main.rs drives the terminal UI; everything it needs lives
// here so integration tests and benchmarks can reach it as `flashvocab::*`.

pub mod app;
pub mod audio;
pub mod config;
pub mod engine;
pub mod event;
pub mod item;
pub mod logging;
pub mod lookup;
pub mod session;
pub mod store;
pub mod ui;
