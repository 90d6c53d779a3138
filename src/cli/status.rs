//! Status command implementation

use crate::cli::output::{format_status_json, format_status_table};
use crate::cli::StatusArgs;
use crate::services::ServiceManager;

/// Run one connection round against every service, report, and tear down.
pub async fn handle_status(args: &StatusArgs, services: &ServiceManager) -> String {
    let status = services.initialize().await;
    let output = if args.json {
        format_status_json(&status)
    } else {
        format_status_table(&status, &services.descriptors())
    };
    services.shutdown();
    output
}
