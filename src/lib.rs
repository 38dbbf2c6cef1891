pub mod config;
pub mod error;
pub mod handlers;
pub mod logger;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;
pub mod validation;
