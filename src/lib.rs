pub mod config;
pub mod downloader;
pub mod error;
pub mod identity;
pub mod logging;
pub mod records;
pub mod utils;

#[cfg(test)]
mod test_support;
