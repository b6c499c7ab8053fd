//! Helpers for publishing ROM builds: `.torrent` creation and Internet Archive uploads,
//! both done by driving an external command line tool.

pub mod args;
pub mod config;
pub mod logging;
pub mod magnet;
pub mod process;
pub mod torrent;
pub mod upload;
