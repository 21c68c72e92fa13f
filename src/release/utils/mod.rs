//! Shared helpers: file system, subprocesses and HTTP upload.

pub mod fs;
pub mod http;
pub mod process;
