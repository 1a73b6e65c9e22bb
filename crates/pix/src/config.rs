use serde::{Deserialize, Serialize};

/// Which applications take part in a PIX query.
///
/// Both names use the `APPLICATION|FACILITY` form. Resolution is disabled
/// unless both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixEndpoints {
    /// Local HL7 application that sends the query.
    #[serde(default)]
    pub local_consumer_application: Option<String>,
    /// Remote PIX manager application that answers it.
    #[serde(default)]
    pub remote_manager_application: Option<String>,
}

impl PixEndpoints {
    pub fn new(local_consumer_application: &str, remote_manager_application: &str) -> Self {
        PixEndpoints {
            local_consumer_application: Some(local_consumer_application.to_string()),
            remote_manager_application: Some(remote_manager_application.to_string()),
        }
    }

    /// Both application names, or `None` if either is missing or empty.
    pub fn applications(&self) -> Option<(&str, &str)> {
        let local = self
            .local_consumer_application
            .as_deref()
            .filter(|s| !s.is_empty())?;
        let remote = self
            .remote_manager_application
            .as_deref()
            .filter(|s| !s.is_empty())?;
        Some((local, remote))
    }

    pub fn is_configured(&self) -> bool {
        self.applications().is_some()
    }
}
