//! Subprocess git gateway and output parsing.

pub mod gateway;
pub mod parse;
pub mod types;

pub use gateway::{GitGateway, ProcessRunner, SystemRunner};
pub use types::{CommitInfo, GitStatus};
