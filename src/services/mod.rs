pub mod command;
pub mod error;
pub mod media;
pub mod storage;
