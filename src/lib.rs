pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod state;
pub mod utils;
pub mod validation;
