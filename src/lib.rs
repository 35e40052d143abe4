//! Optimize Config: Layered Configuration Resolution
//!
//! Loads the Optimize client configuration from the XDG locations, fills in defaults for
//! the selected execution environment and applies user changes that are written back to
//! the file.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
