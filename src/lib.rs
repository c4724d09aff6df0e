//! Content-based movie recommendations over tag text, served over HTTP.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
