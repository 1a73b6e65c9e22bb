//! Node configuration file for `pacs`.
//!
//! # Example
//!
//! ```toml
//! [logging]
//! level = "info"
//! json = false
//!
//! [pix]
//! local_consumer_application = "ARCHIVE|RADIOLOGY"
//! remote_manager_application = "PIXMGR|HIE"
//!
//! [[hl7.applications]]
//! name = "ARCHIVE|RADIOLOGY"
//! default_charset = "8859/1"
//! connections = [{ hostname = "localhost" }]
//!
//! [[hl7.remote_applications]]
//! name = "PIXMGR|HIE"
//! connections = [{ hostname = "pix.example.org", port = 2575 }]
//!
//! [stgcmt]
//! delay_secs = 0
//! max_retries = 3
//! retry_interval_secs = 60
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use pacs_hl7::{Hl7Application, Hl7Device, StaticApplicationCache};
use pacs_pix::PixEndpoints;
use pacs_stgcmt::StgCmtConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub pix: PixEndpoints,
    #[serde(default)]
    pub hl7: Hl7Settings,
    #[serde(default)]
    pub stgcmt: StgCmtConfig,
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: default_level(),
            json: false,
        }
    }
}

/// `[hl7]` section: local applications and known remote applications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hl7Settings {
    #[serde(default)]
    pub applications: Vec<Hl7Application>,
    #[serde(default)]
    pub remote_applications: Vec<Hl7Application>,
}

// ── Functions ─────────────────────────────────────────────────────────────────

impl NodeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn device(&self) -> Hl7Device {
        Hl7Device::new(self.hl7.applications.clone())
    }

    pub fn remote_cache(&self) -> StaticApplicationCache {
        StaticApplicationCache::new(self.hl7.remote_applications.clone())
    }

    /// Check cross-references and values the type system cannot.
    ///
    /// Returns every problem found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors: Vec<String> = Vec::new();

        if self.logging.level.parse::<tracing::Level>().is_err() {
            errors.push(format!(
                "[logging] unknown level '{}' (expected trace, debug, info, warn or error)",
                self.logging.level
            ));
        }

        check_applications("hl7.applications", &self.hl7.applications, &mut errors);
        check_applications(
            "hl7.remote_applications",
            &self.hl7.remote_applications,
            &mut errors,
        );
        for app in &self.hl7.remote_applications {
            if !app.connections.iter().any(|c| c.installed && c.port.is_some()) {
                errors.push(format!(
                    "remote application '{}' has no installed connection with a port",
                    app.name
                ));
            }
        }

        match (
            self.pix.local_consumer_application.as_deref(),
            self.pix.remote_manager_application.as_deref(),
        ) {
            (Some(local), Some(remote)) => {
                if !self.hl7.applications.iter().any(|a| a.name == local) {
                    errors.push(format!(
                        "[pix] local consumer application '{}' is not in [[hl7.applications]]",
                        local
                    ));
                }
                if !self.hl7.remote_applications.iter().any(|a| a.name == remote) {
                    errors.push(format!(
                        "[pix] remote manager application '{}' is not in [[hl7.remote_applications]]",
                        remote
                    ));
                }
            }
            (None, None) => {}
            _ => errors.push(
                "[pix] set both local_consumer_application and remote_manager_application, or neither"
                    .to_string(),
            ),
        }

        if self.stgcmt.max_retries > 0 && self.stgcmt.retry_interval_secs == 0 {
            errors.push("[stgcmt] retry_interval_secs must be positive when retries are enabled".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_applications(section: &str, apps: &[Hl7Application], errors: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    for app in apps {
        if app.name.trim().is_empty() {
            errors.push(format!("[[{}]] entry with empty name", section));
            continue;
        }
        if !seen.insert(app.name.as_str()) {
            errors.push(format!("[[{}]] duplicate application '{}'", section, app.name));
        }
        if let Err(e) = pacs_hl7::charset::encoding_for(app.default_charset()) {
            errors.push(format!("application '{}': {}", app.name, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[logging]
level = "debug"

[pix]
local_consumer_application = "ARCHIVE|RADIOLOGY"
remote_manager_application = "PIXMGR|HIE"

[[hl7.applications]]
name = "ARCHIVE|RADIOLOGY"
default_charset = "8859/1"
connections = [{ hostname = "localhost" }]

[[hl7.remote_applications]]
name = "PIXMGR|HIE"
connections = [{ hostname = "pix.example.org", port = 2575, response_timeout_ms = 5000 }]

[stgcmt]
delay_secs = 2
"#;

    #[test]
    fn parses_sample() {
        let cfg = NodeConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert!(!cfg.logging.json);
        assert!(cfg.pix.is_configured());
        assert_eq!(cfg.hl7.applications[0].default_charset(), Some("8859/1"));
        assert_eq!(
            cfg.hl7.remote_applications[0].connections[0].response_timeout_ms,
            Some(5000)
        );
        assert_eq!(cfg.stgcmt.delay_secs, 2);
        assert_eq!(cfg.stgcmt.max_retries, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_file_is_valid() {
        let cfg = NodeConfig::from_toml_str("").unwrap();
        assert!(!cfg.pix.is_configured());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn reports_all_problems() {
        let cfg = NodeConfig::from_toml_str(
            r#"
[logging]
level = "loud"

[pix]
local_consumer_application = "NOPE|X"
remote_manager_application = "PIXMGR|HIE"

[[hl7.applications]]
name = "ARCHIVE|RADIOLOGY"
default_charset = "KLINGON"

[[hl7.remote_applications]]
name = "PIXMGR|HIE"
connections = [{ hostname = "pix.example.org" }]
"#,
        )
        .unwrap();
        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("loud")));
        assert!(errors.iter().any(|e| e.contains("KLINGON")));
        assert!(errors.iter().any(|e| e.contains("no installed connection")));
        assert!(errors.iter().any(|e| e.contains("NOPE|X")));
    }

    #[test]
    fn half_configured_pix_is_invalid() {
        let cfg = NodeConfig::from_toml_str(
            "[pix]\nlocal_consumer_application = \"ARCHIVE|RADIOLOGY\"\n",
        )
        .unwrap();
        let errors = cfg.validate().unwrap_err();
        assert!(errors[0].contains("or neither"));
    }

    #[test]
    fn missing_file_names_path() {
        let err = NodeConfig::load(Path::new("/nonexistent/pacs.toml")).unwrap_err();
        assert!(err.to_string().starts_with("could not read '/nonexistent/pacs.toml'"));
    }
}
