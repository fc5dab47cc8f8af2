pub mod api;
pub mod backend;
pub mod config;
pub mod data_models;
pub mod error;
pub mod query_engine;
