pub mod audit;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod gateway;
pub mod tracker;
pub mod vote_flow;

pub use error::ReviewError;
