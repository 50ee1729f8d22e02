#![forbid(unsafe_code)]

pub mod build;
pub mod catalog;
pub mod chapter;
pub mod classify;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod discover;
pub mod fetch;
pub mod formats;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod store;
pub mod title;
