use std::path::Path;
use std::process;

use pacs_core::StorageCommitmentRequest;
use pacs_stgcmt::Reconciler;
use pacs_storage::InMemoryCatalog;

use crate::config::LoggingSettings;
use crate::{logging, report_error, runtime, OutputFormat};

pub(crate) fn cmd_stgcmt(
    request_path: &Path,
    catalog_path: &Path,
    output: OutputFormat,
    quiet: bool,
) {
    logging::init(&LoggingSettings::default());

    let request_str = match std::fs::read_to_string(request_path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", request_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let request: StorageCommitmentRequest = match serde_json::from_str(&request_str) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", request_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let catalog = match InMemoryCatalog::from_path(catalog_path) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    let reconciler = Reconciler::new(catalog);
    let result = match runtime(output, quiet).block_on(reconciler.reconcile(&request)) {
        Ok(r) => r,
        Err(e) => {
            report_error(&format!("storage commitment failed: {}", e), output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "event_type_id": result.event_type_id(),
                "result": result,
            });
            let json = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!(
                "Transaction {} (event type {})",
                result.transaction_uid,
                result.event_type_id()
            );
            if let Some(common) = &result.common_retrieve_locations {
                println!(
                    "  retrieve AE: {}",
                    common.primary.as_deref().unwrap_or("-")
                );
                if let Some(external) = &common.external {
                    println!("  external retrieve AE: {}", external);
                }
            }
            for s in &result.successes {
                match s.retrieve_locations.as_ref().and_then(|l| l.primary.as_deref()) {
                    Some(ae) => println!("  committed  {} {} @ {}", s.sop_class_uid, s.sop_instance_uid, ae),
                    None => println!("  committed  {} {}", s.sop_class_uid, s.sop_instance_uid),
                }
            }
            for f in &result.failures {
                println!(
                    "  failed     {} {} ({}, 0x{:04X})",
                    f.sop_class_uid,
                    f.sop_instance_uid,
                    f.reason,
                    f.reason.code()
                );
            }
            if !quiet {
                println!();
                println!(
                    "{} committed, {} failed",
                    result.successes.len(),
                    result.failures.len()
                );
            }
        }
    }
}
