pub mod cli;
pub mod config;
pub mod crypto;
pub mod environment;
pub mod errors;
pub mod exec;
pub mod keystore;
pub mod prompt;
pub mod service;
pub mod vault;
