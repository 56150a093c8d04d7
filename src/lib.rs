pub mod config;
pub mod http;
pub mod humanize;
pub mod manifest;
pub mod model;
pub mod observability;
pub mod orchestrator;
pub mod pipeline;
pub mod processor;
pub mod server;
pub mod storage;
pub mod tracker;
