pub mod aggregator;
pub mod categories;
pub mod config;
pub mod duration;
pub mod error;
pub mod feeds;
pub mod models;
pub mod returns;
