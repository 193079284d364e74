// Library for the binary, tests and demos

pub mod aggregation;
pub mod cache_repo;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod mailer;
pub mod models;
pub mod puppetdb_repo;
pub mod render;
pub mod report;
pub mod version;
