//! Identity and session layer: local credentials, Google sign-in, sessions.

pub mod clients;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
