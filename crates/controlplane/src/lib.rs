//! # controlplane
//!
//! Blocking JSON client for the cloud control-plane API.
//!
//! [`HttpClient`] implements [`declarative::RemoteClient`] on top of `ureq`.
//! Base URLs are resolved from short endpoint names (`ovh-eu`, `ovh-us`,
//! `ovh-ca`, ...) or given as explicit URLs.
//!
//! Request signing and credentials are handled outside this crate.

pub mod endpoint;
pub mod http;

pub use endpoint::{UnknownEndpoint, resolve};
pub use http::{DEFAULT_TIMEOUT, HttpClient};
