pub mod config;
pub mod init;
pub mod jobs;
pub mod log;
pub mod serve;
pub mod sync;
