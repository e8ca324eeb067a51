//! CLI command implementations

pub mod catalog;
pub mod countdown;
pub mod init;
pub mod serve;
pub mod status;
