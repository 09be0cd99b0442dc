//! HTTP route handlers

pub mod health;
