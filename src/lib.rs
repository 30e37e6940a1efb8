pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod logger;
pub mod output;
pub mod report;
pub mod runner;
pub mod stats;
pub mod store;

#[cfg(test)]
mod tests;
