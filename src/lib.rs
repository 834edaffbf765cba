//! Generative media relay
//!
//! Two HTTP services that hand the caller a storage URL immediately, then
//! drive a third-party generation job (Kling image-to-video, or a face swap)
//! to completion in the background and write the result to S3 at that URL.

pub mod app;
pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
