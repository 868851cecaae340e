//! Module identifiers and build identity qualification.
//!
//! # Responsibility
//! - Name a loadable extension module, optionally pinned to a version and
//!   publisher.
//! - Qualify bare identifiers with the running build's identity so a loader
//!   resolves the matching build of a module.
//!
//! # Invariants
//! - A `ModuleId` is immutable once constructed.
//! - `Display` output always parses back into an equal `ModuleId`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Publisher token stamped on every module built alongside this crate.
pub const BUILD_PUBLISHER_TOKEN: &str = "5e1c0d3a9b7f2468";

static MODULE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<name>[a-z0-9]+(?:[._-][a-z0-9]+)*)(?:@(?P<version>\d+\.\d+\.\d+(?:-[0-9a-z.]+)?))?(?:#(?P<publisher>[0-9a-f]{8,64}))?$",
    )
    .expect("valid module id regex")
});
static MODULE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:[._-][a-z0-9]+)*$").expect("valid module name regex"));
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+(?:-[0-9a-z.]+)?$").expect("valid version regex"));
static PUBLISHER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{8,64}$").expect("valid publisher regex"));

/// Identity of the running build, used to pin default module lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildIdentity {
    /// Semantic version (`major.minor.patch`).
    pub version: String,
    /// Lowercase hex publisher token.
    pub publisher: String,
}

impl BuildIdentity {
    /// Identity of the crate currently executing.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            publisher: BUILD_PUBLISHER_TOKEN.to_string(),
        }
    }
}

/// Opaque name of a loadable extension module.
///
/// Textual form is `name[@version][#publisher]`, e.g.
/// `exthost.rust.workspaces@0.1.0#5e1c0d3a9b7f2468`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleId {
    name: String,
    version: Option<String>,
    publisher: Option<String>,
}

impl ModuleId {
    /// Creates an unqualified identifier after validating `name`.
    pub fn new(name: impl Into<String>) -> Result<Self, ModuleIdError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ModuleIdError::EmptyName);
        }
        if !MODULE_NAME_RE.is_match(trimmed) {
            return Err(ModuleIdError::InvalidName(trimmed.to_string()));
        }
        Ok(Self {
            name: trimmed.to_string(),
            version: None,
            publisher: None,
        })
    }

    /// Parses the textual `name[@version][#publisher]` form.
    pub fn parse(value: &str) -> Result<Self, ModuleIdError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModuleIdError::EmptyName);
        }
        let captures = MODULE_ID_RE
            .captures(trimmed)
            .ok_or_else(|| ModuleIdError::InvalidFormat(trimmed.to_string()))?;
        Ok(Self {
            name: captures["name"].to_string(),
            version: captures.name("version").map(|m| m.as_str().to_string()),
            publisher: captures.name("publisher").map(|m| m.as_str().to_string()),
        })
    }

    /// Returns a copy pinned to `version`.
    pub fn with_version(mut self, version: impl Into<String>) -> Result<Self, ModuleIdError> {
        let version = version.into();
        if !VERSION_RE.is_match(version.as_str()) {
            return Err(ModuleIdError::InvalidVersion(version));
        }
        self.version = Some(version);
        Ok(self)
    }

    /// Returns a copy pinned to `publisher`.
    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Result<Self, ModuleIdError> {
        let publisher = publisher.into();
        if !PUBLISHER_RE.is_match(publisher.as_str()) {
            return Err(ModuleIdError::InvalidPublisher(publisher));
        }
        self.publisher = Some(publisher);
        Ok(self)
    }

    /// Returns a copy qualified with `identity`, replacing any existing
    /// version or publisher qualifier.
    pub fn qualified(&self, identity: &BuildIdentity) -> Result<Self, ModuleIdError> {
        Self {
            name: self.name.clone(),
            version: None,
            publisher: None,
        }
        .with_version(identity.version.clone())?
        .with_publisher(identity.publisher.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    /// Identifier with all qualifiers stripped.
    pub fn unqualified(&self) -> Self {
        Self {
            name: self.name.clone(),
            version: None,
            publisher: None,
        }
    }
}

impl Display for ModuleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        if let Some(publisher) = &self.publisher {
            write!(f, "#{publisher}")?;
        }
        Ok(())
    }
}

impl FromStr for ModuleId {
    type Err = ModuleIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModuleId {
    type Error = ModuleIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<ModuleId> for String {
    fn from(value: ModuleId) -> Self {
        value.to_string()
    }
}

/// Module identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleIdError {
    EmptyName,
    InvalidName(String),
    InvalidFormat(String),
    InvalidVersion(String),
    InvalidPublisher(String),
}

impl Display for ModuleIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "module name must not be empty"),
            Self::InvalidName(value) => write!(f, "module name is invalid: {value}"),
            Self::InvalidFormat(value) => write!(
                f,
                "module id is invalid: {value} (expected name[@major.minor.patch][#publisher])"
            ),
            Self::InvalidVersion(value) => write!(
                f,
                "module version is invalid: {value} (expected major.minor.patch)"
            ),
            Self::InvalidPublisher(value) => {
                write!(f, "module publisher token is invalid: {value}")
            }
        }
    }
}

impl Error for ModuleIdError {}

#[cfg(test)]
mod tests {
    use super::{BuildIdentity, ModuleId, ModuleIdError, BUILD_PUBLISHER_TOKEN};

    #[test]
    fn parses_bare_and_qualified_forms() {
        let bare = ModuleId::parse("exthost.workspaces").expect("bare id parse");
        assert_eq!(bare.name(), "exthost.workspaces");
        assert_eq!(bare.version(), None);
        assert_eq!(bare.publisher(), None);

        let full = ModuleId::parse("exthost.rust.workspaces@1.2.3#0123abcd")
            .expect("qualified id parse");
        assert_eq!(full.name(), "exthost.rust.workspaces");
        assert_eq!(full.version(), Some("1.2.3"));
        assert_eq!(full.publisher(), Some("0123abcd"));
        assert_eq!(full.to_string(), "exthost.rust.workspaces@1.2.3#0123abcd");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(ModuleId::parse("  ").unwrap_err(), ModuleIdError::EmptyName);
        assert!(matches!(
            ModuleId::parse("Exthost Workspaces").unwrap_err(),
            ModuleIdError::InvalidFormat(_)
        ));
        assert!(matches!(
            ModuleId::parse("exthost..workspaces").unwrap_err(),
            ModuleIdError::InvalidFormat(_)
        ));
        assert!(matches!(
            ModuleId::parse("exthost@v1").unwrap_err(),
            ModuleIdError::InvalidFormat(_)
        ));
        assert!(matches!(
            ModuleId::new("Upper").unwrap_err(),
            ModuleIdError::InvalidName(_)
        ));
    }

    #[test]
    fn qualifies_with_current_build_identity() {
        let id = ModuleId::new("exthost.workspaces").expect("valid name");
        let qualified = id
            .qualified(&BuildIdentity::current())
            .expect("current build identity is valid");
        assert_eq!(qualified.version(), Some(env!("CARGO_PKG_VERSION")));
        assert_eq!(qualified.publisher(), Some(BUILD_PUBLISHER_TOKEN));
        assert_eq!(qualified.unqualified(), id);
    }

    #[test]
    fn rejects_invalid_qualifiers() {
        let id = ModuleId::new("exthost.workspaces").expect("valid name");
        assert!(matches!(
            id.clone().with_version("1.0").unwrap_err(),
            ModuleIdError::InvalidVersion(_)
        ));
        assert!(matches!(
            id.with_publisher("XYZ").unwrap_err(),
            ModuleIdError::InvalidPublisher(_)
        ));
    }

    #[test]
    fn serializes_as_display_string() {
        let id = ModuleId::parse("exthost.workspaces@0.1.0").expect("valid id");
        let json = serde_json::to_value(&id).expect("serialize id");
        assert_eq!(json, "exthost.workspaces@0.1.0");
        let decoded: ModuleId = serde_json::from_value(json).expect("deserialize id");
        assert_eq!(decoded, id);
    }
}
