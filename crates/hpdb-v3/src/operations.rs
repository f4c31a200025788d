//! Operation table for the HPDB v3 API.
//!
//! Paths are relative to the service URL, which already ends in `/api/v3`.

use hpdb_core::{OperationDescriptor, ParamSpec};
use reqwest::Method;

/// Service name used to look up configuration (`HPDB_URL`, `HPDB_APIKEY`, ...).
pub const DEFAULT_SERVICE_NAME: &str = "hpdb";

/// Public endpoint used when no URL is configured.
pub const DEFAULT_SERVICE_URL: &str = "https://api.us-south.hpdbaas.cloud.ibm.com/api/v3";

/// Get database cluster details.
pub static GET_CLUSTER: OperationDescriptor = OperationDescriptor::new(
    "GetCluster",
    Method::GET,
    "/clusters/{cluster_id}",
    &[ParamSpec::path("cluster_id")],
);

/// List database users.
pub static LIST_USERS: OperationDescriptor = OperationDescriptor::new(
    "ListUsers",
    Method::GET,
    "/clusters/{cluster_id}/users",
    &[ParamSpec::path("cluster_id")],
);

/// Get database user details.
pub static GET_USER: OperationDescriptor = OperationDescriptor::new(
    "GetUser",
    Method::GET,
    "/clusters/{cluster_id}/users/{db_user_id}",
    &[ParamSpec::path("cluster_id"), ParamSpec::path("db_user_id")],
);

/// List databases.
pub static LIST_DATABASES: OperationDescriptor = OperationDescriptor::new(
    "ListDatabases",
    Method::GET,
    "/clusters/{cluster_id}/databases",
    &[ParamSpec::path("cluster_id")],
);

/// Scale cluster CPU, memory or storage.
pub static SCALE_RESOURCES: OperationDescriptor = OperationDescriptor::new(
    "ScaleResources",
    Method::POST,
    "/clusters/{cluster_id}/resource",
    &[ParamSpec::path("cluster_id"), ParamSpec::body("resource", false)],
);

/// Get database configuration.
pub static GET_CONFIGURATION: OperationDescriptor = OperationDescriptor::new(
    "GetConfiguration",
    Method::GET,
    "/clusters/{cluster_id}/configuration",
    &[ParamSpec::path("cluster_id")],
);

/// Update database configuration.
pub static UPDATE_CONFIGURATION: OperationDescriptor = OperationDescriptor::new(
    "UpdateConfiguration",
    Method::PATCH,
    "/clusters/{cluster_id}/configuration",
    &[
        ParamSpec::path("cluster_id"),
        ParamSpec::body("configuration", false),
    ],
);

/// List cluster tasks.
pub static LIST_TASKS: OperationDescriptor = OperationDescriptor::new(
    "ListTasks",
    Method::GET,
    "/clusters/{cluster_id}/tasks",
    &[ParamSpec::path("cluster_id")],
);

/// Show one task.
pub static GET_TASK: OperationDescriptor = OperationDescriptor::new(
    "GetTask",
    Method::GET,
    "/clusters/{cluster_id}/tasks/{task_id}",
    &[ParamSpec::path("cluster_id"), ParamSpec::path("task_id")],
);

/// List the log files of a node.
pub static LIST_NODE_LOGS: OperationDescriptor = OperationDescriptor::new(
    "ListNodeLogs",
    Method::GET,
    "/nodes/{node_id}/logs",
    &[ParamSpec::path("node_id")],
);

/// Download one log file. `Accept` selects JSON or plain text.
pub static GET_LOG: OperationDescriptor = OperationDescriptor::new(
    "GetLog",
    Method::GET,
    "/nodes/{node_id}/logs/{log_name}",
    &[
        ParamSpec::path("node_id"),
        ParamSpec::path("log_name"),
        ParamSpec::header("Accept", false),
    ],
);

/// Every operation the client exposes.
pub static ALL: [&OperationDescriptor; 11] = [
    &GET_CLUSTER,
    &LIST_USERS,
    &GET_USER,
    &LIST_DATABASES,
    &SCALE_RESOURCES,
    &GET_CONFIGURATION,
    &UPDATE_CONFIGURATION,
    &LIST_TASKS,
    &GET_TASK,
    &LIST_NODE_LOGS,
    &GET_LOG,
];

#[cfg(test)]
mod tests {
    use super::*;
    use hpdb_core::{request, ParamLocation, RequestOptions};

    #[test]
    fn only_mutations_are_non_idempotent() {
        let mutating: Vec<&str> = ALL
            .iter()
            .filter(|op| !op.is_idempotent())
            .map(|op| op.name)
            .collect();
        assert_eq!(mutating, vec!["ScaleResources", "UpdateConfiguration"]);
    }

    #[test]
    fn every_placeholder_is_declared() {
        for op in ALL {
            for spec in op.params_at(ParamLocation::Path) {
                let placeholder = format!("{{{}}}", spec.name);
                assert!(op.path.contains(&placeholder), "{} lacks {}", op.name, placeholder);
            }
        }
    }

    #[test]
    fn get_user_reports_both_missing_ids() {
        let err = request::build(&GET_USER, &RequestOptions::new()).unwrap_err();
        match err {
            hpdb_core::Error::Validation { operation, missing, .. } => {
                assert_eq!(operation, "GetUser");
                assert_eq!(missing, vec!["cluster_id", "db_user_id"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn get_log_sends_accept_header() {
        let request = request::build(
            &GET_LOG,
            &RequestOptions::new()
                .with("node_id", "c5ff2d84")
                .with("log_name", "audit.log")
                .with("Accept", "text/plain"),
        )
        .unwrap();

        assert_eq!(request.path(), "/nodes/c5ff2d84/logs/audit.log");
        assert_eq!(request.headers().get("accept").unwrap(), "text/plain");
    }

    fn required(op: &OperationDescriptor) -> Vec<&'static str> {
        op.params.iter().filter(|p| p.required).map(|p| p.name).collect()
    }

    fn missing_of(op: &OperationDescriptor, options: &RequestOptions) -> Vec<String> {
        match request::build(op, options) {
            Err(hpdb_core::Error::Validation { missing, .. }) => missing,
            other => panic!("{}: expected validation error, got {other:?}", op.name),
        }
    }

    #[test]
    fn required_values_appear_exactly_once() {
        for (i, op) in ALL.iter().enumerate() {
            let bound: Vec<(&str, String)> = required(op)
                .into_iter()
                .enumerate()
                .map(|(j, name)| (name, format!("v{i}x{j}z")))
                .collect();
            let options = bound
                .iter()
                .fold(RequestOptions::new(), |acc, (name, value)| acc.with(*name, value.as_str()));

            let request = request::build(op, &options)
                .unwrap_or_else(|err| panic!("{} failed to build: {err}", op.name));

            let mut rendered = vec![request.path().to_string()];
            rendered.extend(request.query().iter().map(|(_, v)| v.clone()));
            rendered.extend(
                request
                    .headers()
                    .values()
                    .filter_map(|v| v.to_str().ok())
                    .map(ToString::to_string),
            );
            if let Some(body) = request.body() {
                rendered.push(body.to_string());
            }

            for (name, value) in &bound {
                let seen: usize = rendered.iter().map(|part| part.matches(value.as_str()).count()).sum();
                assert_eq!(seen, 1, "{} sent `{name}` {seen} times", op.name);
            }
        }
    }

    #[test]
    fn each_missing_required_parameter_is_named() {
        for op in ALL {
            let names = required(op);
            let full = names
                .iter()
                .fold(RequestOptions::new(), |acc, name| acc.with(*name, "x"));

            for name in &names {
                let mut options = full.clone();
                options.unset(name);
                assert_eq!(missing_of(op, &options), vec![name.to_string()], "{}", op.name);
            }

            let all: Vec<String> = names.iter().map(ToString::to_string).collect();
            assert_eq!(missing_of(op, &RequestOptions::new()), all, "{}", op.name);
        }
    }
}
