use std::path::Path;
use std::process;

use pacs_core::IdWithIssuer;
use pacs_hl7::MllpExchange;
use pacs_pix::PixResolver;

use crate::config::NodeConfig;
use crate::{logging, report_error, runtime, OutputFormat};

pub(crate) fn cmd_pix_query(pid: &str, config_path: &Path, output: OutputFormat, quiet: bool) {
    let config = match NodeConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    logging::init(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            report_error(&format!("invalid configuration: {}", e), output, quiet);
        }
        process::exit(1);
    }

    let pid: IdWithIssuer = match pid.parse() {
        Ok(p) => p,
        Err(e) => {
            report_error(&format!("invalid patient identifier: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let resolver = PixResolver::new(config.device(), config.remote_cache(), MllpExchange::new());
    let identities = runtime(output, quiet).block_on(resolver.resolve(Some(&pid), &config.pix));

    match output {
        OutputFormat::Json => {
            let ids: Vec<String> = identities.iter().map(|id| id.to_string()).collect();
            let value = serde_json::json!({
                "pid": pid.to_string(),
                "identifiers": ids,
            });
            let json = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            for id in &identities {
                println!("{}", id);
            }
            if !quiet && identities.len() == 1 {
                eprintln!("no aliases found for {}", pid);
            }
        }
    }
}
