// src/lib.rs — Library root for Chronos

pub mod audio;
pub mod cli;
pub mod client;
pub mod core;
pub mod infra;
pub mod session;
pub mod storage;
pub mod util;
