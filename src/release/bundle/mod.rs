//! Release bundle assembly.
//!
//! The save step of every platform stages its files into
//! `<home>/<platform>/` and compresses that directory into
//! `<home>/<name>-<version>-<platform>.tar.gz`.

mod archive;
mod assembler;

pub use archive::{compress_dir, list_archive};
pub use assembler::{BundleAssembler, collect_save_images};
