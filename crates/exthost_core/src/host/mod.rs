//! Host services: registries built from module sets.
//!
//! # Responsibility
//! - Construct registries from contexts, module handles or identifiers.
//! - Provide the process-wide default registry.
//! - Hand out per-workspace views over a registry.
//!
//! # Invariants
//! - A registry's module set is fixed at construction.
//! - Configuration errors fail construction; module load failures never do.

use crate::module::{ModuleHandle, ModuleId, ModuleIdError, ModuleLoader};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod defaults;
mod registry;
pub mod workspace;

pub use defaults::{
    default_module_loader, default_modules, default_registry, install_default_module_loader,
    resolve_default_modules, InstallOnce, DEFAULT_MODULE_IDENTIFIERS,
};
pub use registry::{HostServices, Registry};
pub use workspace::{LanguageMetadata, WorkspaceServices};

/// Loads each identifier in order, dropping modules that fail to load.
pub fn load_available_modules(ids: &[ModuleId], loader: &dyn ModuleLoader) -> Vec<ModuleHandle> {
    let mut modules = Vec::with_capacity(ids.len());
    for id in ids {
        match loader.load(id) {
            Ok(module) => {
                debug!(
                    "event=module_load module=host status=ok module_id={}",
                    id
                );
                modules.push(module);
            }
            Err(err) => {
                warn!(
                    "event=module_load module=host status=skipped module_id={} error={}",
                    id, err
                );
            }
        }
    }
    modules
}

/// Invalid construction input; raised synchronously, never ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    EmptyModuleList,
    InvalidModuleId(ModuleIdError),
    LoaderAlreadyInstalled,
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyModuleList => write!(f, "module identifier list must not be empty"),
            Self::InvalidModuleId(err) => write!(f, "invalid module identifier: {err}"),
            Self::LoaderAlreadyInstalled => {
                write!(f, "default module loader is already installed")
            }
        }
    }
}

impl Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidModuleId(err) => Some(err),
            Self::EmptyModuleList | Self::LoaderAlreadyInstalled => None,
        }
    }
}

impl From<ModuleIdError> for ConfigurationError {
    fn from(value: ModuleIdError) -> Self {
        Self::InvalidModuleId(value)
    }
}
