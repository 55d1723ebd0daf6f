pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod pipeline;
pub mod scanner;
pub mod status;
