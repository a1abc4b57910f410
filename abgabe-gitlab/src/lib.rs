//! # abgabe-gitlab
//!
//! Blocking GitLab REST v4 client implementing [`abgabe_core::Platform`].
//!
//! Construct a [`GitlabClient`] from the loaded configuration with
//! [`GitlabClient::from_config`] and pass it as `&dyn Platform`.

pub mod client;
pub mod error;

pub use client::GitlabClient;
