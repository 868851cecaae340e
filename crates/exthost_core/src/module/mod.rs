//! Extension modules and the loader contract.
//!
//! # Responsibility
//! - Define the loaded-module handle the composition engine scans.
//! - Define the loader capability that turns identifiers into handles.
//!
//! # Invariants
//! - The core never mutates a module handle; it only enumerates exports.
//! - Export enumeration is explicit registration, never runtime inspection.

use crate::composition::ExportDeclaration;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod identifier;
pub mod loader;
pub mod static_module;

pub use identifier::{BuildIdentity, ModuleId, ModuleIdError, BUILD_PUBLISHER_TOKEN};
pub use loader::{CatalogError, LoadError, ModuleLoader, StaticModuleLoader};
pub use static_module::StaticModule;

/// A loaded unit contributing zero or more exports.
pub trait ExtensionModule: Send + Sync {
    fn id(&self) -> &ModuleId;

    /// Enumerates this module's export declarations in declaration order.
    fn exports(&self) -> Result<Vec<ExportDeclaration>, ModuleError>;
}

/// Shared handle to a loaded module, owned by the loader.
pub type ModuleHandle = Arc<dyn ExtensionModule>;

/// Module-level declaration failure; the whole module is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleError {
    module: ModuleId,
    reason: String,
}

impl ModuleError {
    pub fn new(module: ModuleId, reason: impl Into<String>) -> Self {
        Self {
            module,
            reason: reason.into(),
        }
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Display for ModuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "module {} has invalid export declarations: {}",
            self.module, self.reason
        )
    }
}

impl Error for ModuleError {}
