//! Library crate for poker-nights-back, exposing modules for binaries and integration tests.

pub mod auth;
mod config;
pub mod dao;
mod dto;
mod error;
pub mod routes;
pub mod scheduling;
pub mod services;
pub mod state;
