use std::path::Path;
use std::process;

use crate::config::NodeConfig;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_check_config(file: &Path, output: OutputFormat, quiet: bool) {
    let config = match NodeConfig::load(file) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    let errors = config.validate().err().unwrap_or_default();

    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "valid": errors.is_empty(),
                "errors": errors,
            });
            println!("{}", value);
        }
        OutputFormat::Text => {
            if errors.is_empty() {
                if !quiet {
                    println!(
                        "configuration OK: {} local, {} remote HL7 applications, PIX {}",
                        config.hl7.applications.len(),
                        config.hl7.remote_applications.len(),
                        if config.pix.is_configured() {
                            "enabled"
                        } else {
                            "disabled"
                        }
                    );
                }
            } else {
                for e in &errors {
                    report_error(&format!("error: {}", e), output, quiet);
                }
            }
        }
    }

    if !errors.is_empty() {
        process::exit(1);
    }
}
