pub mod config;
pub mod fetch;
pub mod report;
pub mod score;
pub mod transcribe;
