//! Shared helpers: atomic file output and logging setup

pub mod io;
pub mod logger;

pub use self::{
    io::{ensure_parent_dir, has_allowed_extension, write_atomic},
    logger::init_logging,
};
