//! HTTP handlers

pub mod health;
pub mod auth;
pub mod analysis;
pub mod alerts;
