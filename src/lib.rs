pub mod cli;
pub mod config;
pub mod error;
pub mod matcher;
pub mod reader;
pub mod scanner;
pub mod search;
pub mod session;
pub mod sheet_selector;
pub mod sink;
