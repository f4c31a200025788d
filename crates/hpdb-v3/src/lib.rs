//! Hyper Protect DBaaS (HPDB) v3 client.
//!
//! Typed models, the operation table and an asynchronous client for managing
//! database clusters: cluster details, users, databases, resource scaling,
//! configuration, tasks and node logs.
//!
//! ```no_run
//! use hpdb_core::RequestOptions;
//! use hpdb_v3::HpdbClient;
//!
//! # async fn demo() -> hpdb_v3::Result<()> {
//! let client = HpdbClient::from_env()?;
//! let cluster = client
//!     .get_cluster(&RequestOptions::new().with("cluster_id", "a958e854"))
//!     .await?;
//! println!("{:?}", cluster.result().state);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod models;
pub mod operations;

pub use client::{HpdbClient, HpdbClientBuilder};
pub use models::{
    Cluster, Configuration, ConfigurationItem, Database, DatabaseList, Log, LogList, LogSummary,
    Node, Resource, ScaleResourcesResource, Task, TaskAccepted, TaskList, TaskReference,
    UpdateConfigurationData, UserDetails, UserList, UserSummary,
};
pub use operations::{DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_URL};

/// Convenient result alias that reuses the shared client error type.
pub type Result<T> = hpdb_core::Result<T>;
