//! HPDB v3 request and response models.
//!
//! Response fields are optional unless the service always returns them, so partial
//! payloads still decode. Numeric sizes the service reports as integers stay `i64`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Database cluster details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cluster {
    /// Cluster ID.
    pub id: String,
    /// Cluster name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Region the cluster runs in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Resource group ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_id: Option<String>,
    /// Database type (postgresql, mongodb).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_type: Option<String>,
    /// Lifecycle state (provisioning, active, ...).
    #[serde(default, alias = "status", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Public connection endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_endpoint: Option<String>,
    /// Private connection endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_endpoint: Option<String>,
    /// Private endpoint type (vpe, cse).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_endpoint_type: Option<String>,
    /// Log shipping URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
    /// Metrics URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_url: Option<String>,
    /// Per-node resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
    /// Cluster members.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// One cluster member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID.
    pub id: String,
    /// Node name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Node state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Replication role (primary, replica).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Replica state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_state: Option<String>,
    /// Replication lag in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_lag: Option<i64>,
}

/// Resources allocated to each node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    /// Number of CPUs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<i64>,
    /// Memory, e.g. `2GiB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    /// Storage, e.g. `5GiB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

/// Users of a cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserList {
    /// Users.
    #[serde(default)]
    pub users: Vec<UserSummary>,
}

/// Entry in a [`UserList`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    /// Database user ID.
    #[serde(alias = "dbUserId")]
    pub db_user_id: String,
    /// Database user type (admin, normal).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_user_type: Option<String>,
    /// Authentication database (MongoDB).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_db: Option<String>,
}

/// Full details of one database user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDetails {
    /// Database user ID.
    #[serde(alias = "dbUserId")]
    pub db_user_id: String,
    /// Database user type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_user_type: Option<String>,
    /// Authentication database (MongoDB).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_db: Option<String>,
    /// Roles granted to the user, as returned by the database.
    #[serde(default)]
    pub roles: Vec<serde_json::Value>,
}

/// Databases of a cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatabaseList {
    /// Databases.
    #[serde(default)]
    pub databases: Vec<Database>,
}

/// One database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Database {
    /// Database name.
    pub name: String,
    /// Size on disk in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_on_disk: Option<i64>,
}

/// Requested resources for `ScaleResources`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScaleResourcesResource {
    /// Number of CPUs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<i64>,
    /// Memory, e.g. `2GiB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    /// Storage, e.g. `5GiB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

impl ScaleResourcesResource {
    /// Set the CPU count.
    #[must_use]
    pub fn with_cpu(mut self, cpu: i64) -> Self {
        self.cpu = Some(cpu);
        self
    }

    /// Set the memory size.
    #[must_use]
    pub fn with_memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = Some(memory.into());
        self
    }

    /// Set the storage size.
    #[must_use]
    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = Some(storage.into());
        self
    }
}

/// Settings for `UpdateConfiguration`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateConfigurationData {
    /// Lock wait before deadlock detection, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadlock_timeout: Option<i64>,
    /// Maximum locks per transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_locks_per_transaction: Option<i64>,
    /// Shared buffers, in 8 KiB pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_buffers: Option<i64>,
    /// Maximum concurrent connections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<i64>,
}

/// Returned by asynchronous mutations (202 Accepted).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskAccepted {
    /// Task tracking the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskReference>,
}

/// Pointer to a background task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskReference {
    /// Task ID, usable with `GetTask`.
    pub id: String,
}

/// Current database configuration, keyed by setting name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Configuration {
    /// Settings.
    #[serde(default)]
    pub configuration: BTreeMap<String, ConfigurationItem>,
}

impl Configuration {
    /// Look up one setting.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConfigurationItem> {
        self.configuration.get(name)
    }
}

/// One configuration setting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigurationItem {
    /// Value type (integer, string, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Current value.
    #[serde(default)]
    pub value: serde_json::Value,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    /// Where the value came from (default, user).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Whether changing it restarts the database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<bool>,
}

/// Tasks of a cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskList {
    /// Tasks, newest first.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Background task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Task ID.
    pub id: String,
    /// Task type (scale_resources, update_configuration, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Task status (running, succeeded, failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Completion percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<i64>,
    /// Start time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Completion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Requested change, echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
}

impl Task {
    /// Returns true once the task has finished, successfully or not.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
            || matches!(self.status.as_deref(), Some("succeeded" | "failed"))
    }
}

/// Log files of a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogList {
    /// Log files.
    #[serde(default)]
    pub logs: Vec<LogSummary>,
}

/// Entry in a [`LogList`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSummary {
    /// File name, usable as `log_name` with `GetLog`.
    pub filename: String,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Log file content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Log {
    /// File name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// File content.
    #[serde(default)]
    pub content: String,
}
