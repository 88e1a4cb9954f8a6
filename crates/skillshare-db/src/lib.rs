//! PostgreSQL persistence for learning plans and user profiles.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
