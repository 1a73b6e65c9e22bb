//! Patient identifiers scoped by an optional issuing authority.
//!
//! The textual form follows the HL7 CX data type as used in PID-3 and in
//! the PIX query parameter: `ID[^^^ISSUER]`, where `ISSUER` is the
//! `&`-delimited triple `namespace&universal-id&universal-id-type`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separates CX components (`ID^check-digit^scheme^issuer`).
pub const COMPONENT_SEPARATOR: char = '^';

/// Separates the sub-components of an issuer inside a CX value.
pub const SUBCOMPONENT_SEPARATOR: char = '&';

/// Index of the assigning-authority component within a CX value.
const ISSUER_COMPONENT: usize = 3;

// ──────────────────────────────────────────────
// Issuer
// ──────────────────────────────────────────────

/// The authority that assigned an identifier.
///
/// Any subset of the three fields may be absent, but never all of them:
/// the constructors return `None` instead of an empty issuer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issuer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    local_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    universal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    universal_id_type: Option<String>,
}

impl Issuer {
    /// Build an issuer from its three fields. Empty strings count as absent.
    pub fn new(
        local_namespace: Option<&str>,
        universal_id: Option<&str>,
        universal_id_type: Option<&str>,
    ) -> Option<Self> {
        let issuer = Issuer {
            local_namespace: non_empty(local_namespace),
            universal_id: non_empty(universal_id),
            universal_id_type: non_empty(universal_id_type),
        };
        if issuer.local_namespace.is_none()
            && issuer.universal_id.is_none()
            && issuer.universal_id_type.is_none()
        {
            None
        } else {
            Some(issuer)
        }
    }

    /// An issuer identified by its local namespace only.
    pub fn local(local_namespace: &str) -> Option<Self> {
        Self::new(Some(local_namespace), None, None)
    }

    /// Parse `namespace<delim>uid<delim>type`. Missing trailing fields are absent.
    pub fn parse(s: &str, delim: char) -> Option<Self> {
        let mut parts = s.split(delim);
        let ns = parts.next();
        let uid = parts.next();
        let uid_type = parts.next();
        Self::new(ns, uid, uid_type)
    }

    pub fn local_namespace(&self) -> Option<&str> {
        self.local_namespace.as_deref()
    }

    pub fn universal_id(&self) -> Option<&str> {
        self.universal_id.as_deref()
    }

    pub fn universal_id_type(&self) -> Option<&str> {
        self.universal_id_type.as_deref()
    }

    /// Render the issuer with `delim` between its fields.
    ///
    /// A namespace-only issuer renders as the bare namespace; otherwise all
    /// three positions are emitted, absent ones as empty strings.
    pub fn render(&self, delim: char) -> String {
        let ns = self.local_namespace.as_deref().unwrap_or("");
        if self.universal_id.is_none() && self.universal_id_type.is_none() {
            return ns.to_string();
        }
        format!(
            "{}{}{}{}{}",
            ns,
            delim,
            self.universal_id.as_deref().unwrap_or(""),
            delim,
            self.universal_id_type.as_deref().unwrap_or("")
        )
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(SUBCOMPONENT_SEPARATOR))
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|v| !v.is_empty()).map(str::to_string)
}

// ──────────────────────────────────────────────
// IdWithIssuer
// ──────────────────────────────────────────────

/// Errors from parsing the textual identifier form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdError {
    #[error("identifier is empty in '{input}'")]
    EmptyId { input: String },
}

/// A patient identifier plus the authority that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdWithIssuer {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,
}

impl IdWithIssuer {
    pub fn new(id: impl Into<String>, issuer: Option<Issuer>) -> Self {
        IdWithIssuer {
            id: id.into(),
            issuer,
        }
    }

    /// An identifier without issuing authority.
    pub fn unscoped(id: impl Into<String>) -> Self {
        Self::new(id, None)
    }

    /// Parse one CX value: `ID^^^ISSUER`. Components other than the id and
    /// the assigning authority are ignored.
    pub fn parse_cx(cx: &str) -> Result<Self, ParseIdError> {
        let components: Vec<&str> = cx.split(COMPONENT_SEPARATOR).collect();
        let id = components[0];
        if id.is_empty() {
            return Err(ParseIdError::EmptyId {
                input: cx.to_string(),
            });
        }
        let issuer = components
            .get(ISSUER_COMPONENT)
            .and_then(|s| Issuer::parse(s, SUBCOMPONENT_SEPARATOR));
        Ok(Self::new(id, issuer))
    }

    /// True when the id carries a query wildcard (`*` or `?`).
    pub fn contains_wildcard(&self) -> bool {
        self.id.contains(['*', '?'])
    }

    /// "Same identifier" check: ids must be equal, and issuers must be equal
    /// when both sides carry one. An unscoped id matches any issuer.
    pub fn matches(&self, other: &IdWithIssuer) -> bool {
        if self.id != other.id {
            return false;
        }
        match (&self.issuer, &other.issuer) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl fmt::Display for IdWithIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issuer {
            None => f.write_str(&self.id),
            Some(issuer) => write!(
                f,
                "{}{sep}{sep}{sep}{}",
                self.id,
                issuer.render(SUBCOMPONENT_SEPARATOR),
                sep = COMPONENT_SEPARATOR
            ),
        }
    }
}

impl FromStr for IdWithIssuer {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_cx(s)
    }
}

// ──────────────────────────────────────────────
// IdentitySet
// ──────────────────────────────────────────────

/// Result of identity resolution: the queried identifier first, followed by
/// the aliases in the order the identity manager returned them.
///
/// Duplicates are kept; use [`IdentitySet::deduplicated`] if you need them gone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentitySet(Vec<IdWithIssuer>);

impl IdentitySet {
    pub fn empty() -> Self {
        IdentitySet(Vec::new())
    }

    pub fn single(primary: IdWithIssuer) -> Self {
        IdentitySet(vec![primary])
    }

    pub fn with_aliases(
        primary: IdWithIssuer,
        aliases: impl IntoIterator<Item = IdWithIssuer>,
    ) -> Self {
        let mut ids = vec![primary];
        ids.extend(aliases);
        IdentitySet(ids)
    }

    /// The identifier the resolution started from.
    pub fn primary(&self) -> Option<&IdWithIssuer> {
        self.0.first()
    }

    pub fn aliases(&self) -> &[IdWithIssuer] {
        self.0.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IdWithIssuer> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[IdWithIssuer] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<IdWithIssuer> {
        self.0
    }

    /// Identifiers that carry an issuer, i.e. the ones usable as
    /// Other Patient IDs.
    pub fn scoped(&self) -> impl Iterator<Item = &IdWithIssuer> {
        self.0.iter().filter(|id| id.issuer.is_some())
    }

    /// Copy of the set with structurally equal repeats removed. The first
    /// occurrence wins, so the primary identifier stays at index 0.
    pub fn deduplicated(&self) -> Self {
        let mut out: Vec<IdWithIssuer> = Vec::with_capacity(self.0.len());
        for id in &self.0 {
            if !out.contains(id) {
                out.push(id.clone());
            }
        }
        IdentitySet(out)
    }
}

impl IntoIterator for IdentitySet {
    type Item = IdWithIssuer;
    type IntoIter = std::vec::IntoIter<IdWithIssuer>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a IdentitySet {
    type Item = &'a IdWithIssuer;
    type IntoIter = std::slice::Iter<'a, IdWithIssuer>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for IdentitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
