// src/lib.rs
// Library interface for crt-expiry
pub mod cli;
pub mod config;
pub mod crtsh;
pub mod dedupe;
pub mod error;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod verify;
