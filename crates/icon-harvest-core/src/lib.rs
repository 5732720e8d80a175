pub mod config;
pub mod logging;

pub mod catalog;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod fetch_page;
pub mod harvest;
pub mod retry;
pub mod runner;
pub mod state;
pub mod storage;
pub mod url_model;

pub use error::{HarvestError, Result};
