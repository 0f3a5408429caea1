pub mod access;
pub mod config;
pub mod notify;
pub mod output;
pub mod records;
pub mod scoring;
pub mod store;
