pub mod config;
pub mod db;
pub mod esocial;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod period;
pub mod repos;
pub mod routes;
pub mod services;
pub mod validation;
