pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod pagination;
pub mod query;
pub mod storage;
pub mod validate;
