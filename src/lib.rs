pub mod analyzers;
pub mod collection;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod record;
pub mod report;
