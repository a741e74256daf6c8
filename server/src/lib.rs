//! Room reservation and availability engine for the hotel operations
//! platform, with its HTTP surface.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;
