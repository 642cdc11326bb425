pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod entities;
pub mod error;
pub mod proximity;
pub mod store;

pub mod simulation;
