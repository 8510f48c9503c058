pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod host;
pub mod interactive;
pub mod logging;
pub mod render;
pub mod report;
pub mod scanner;
pub mod session;
