// JustSpeak backend
//
// This crate provides the GraphQL API for transcription, model-backed
// content analysis, SEO dashboard data, and multi-channel post generation.
// Architecture: kernel (infrastructure) + domains (business logic) +
// server (axum + juniper surface).

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
