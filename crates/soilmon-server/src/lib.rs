pub mod config;
pub mod ingest;
pub mod pipeline;
pub mod sink;
