//! # hpdb-core
//!
//! Generic REST client core used by the HPDB service crates.
//!
//! This crate turns static operation descriptors and per-call option values into
//! authenticated HTTP requests, sends them with retries, and decodes the responses
//! into typed results or structured errors.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy shared by every client crate
//! - [`config`] - Configuration resolution (overrides, environment, credentials file)
//! - [`auth`] - Authenticators applied right before each request is sent
//! - [`operation`] - Operation descriptors and request options
//! - [`query`] - Ordered query parameter builder
//! - [`request`] - Request construction and parameter validation
//! - [`transport`] - HTTP transport boundary and the reqwest implementation
//! - [`invoker`] - Retrying, cancellable invocation and response classification
//! - [`response`] - Typed responses with transport metadata
//! - [`client`] - Retry policy, timeout defaults and the composed service client

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod invoker;
pub mod operation;
pub mod query;
pub mod request;
pub mod response;
pub mod transport;

// Re-export commonly used types
pub use client::{RetryPolicy, ServiceClient, ServiceClientBuilder};
pub use config::{ClientConfig, ConfigResolver};
pub use error::{ApiError, Error, Result};
pub use invoker::CallContext;
pub use operation::{OperationDescriptor, ParamLocation, ParamSpec, RequestOptions};
pub use response::Response;
