//! HTTP API: configuration, routing, authentication and access control.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
pub mod policy;
