//! Module loader contract and the in-process catalog loader.
//!
//! # Responsibility
//! - Define how identifiers turn into loaded module handles.
//! - Provide a catalog-backed loader for modules linked into the process.
//!
//! # Invariants
//! - Loading reports failures as `LoadError`; it never panics.
//! - A version or publisher qualifier on the request must match the module.

use crate::module::{ModuleHandle, ModuleId};
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Capability that physically loads a module into the process.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, id: &ModuleId) -> Result<ModuleHandle, LoadError>;
}

/// Module load failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    NotFound(ModuleId),
    VersionMismatch {
        requested: ModuleId,
        available: String,
    },
    PublisherMismatch {
        requested: ModuleId,
        available: String,
    },
    Malformed {
        module: ModuleId,
        reason: String,
    },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "module not found: {id}"),
            Self::VersionMismatch {
                requested,
                available,
            } => write!(
                f,
                "module version mismatch: requested {requested}, available {available}"
            ),
            Self::PublisherMismatch {
                requested,
                available,
            } => write!(
                f,
                "module publisher mismatch: requested {requested}, available {available}"
            ),
            Self::Malformed { module, reason } => {
                write!(f, "module is malformed: {module}: {reason}")
            }
        }
    }
}

impl Error for LoadError {}

/// Loader over modules registered in-process, keyed by module name.
#[derive(Default)]
pub struct StaticModuleLoader {
    modules: BTreeMap<String, ModuleHandle>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one module under its unqualified name.
    pub fn register(&mut self, module: ModuleHandle) -> Result<(), CatalogError> {
        let name = module.id().name().to_string();
        if self.modules.contains_key(name.as_str()) {
            return Err(CatalogError::DuplicateModule(name));
        }
        self.modules.insert(name, module);
        Ok(())
    }

    /// Builder form of [`StaticModuleLoader::register`].
    pub fn with_module(mut self, module: ModuleHandle) -> Result<Self, CatalogError> {
        self.register(module)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Returns sorted registered module names.
    pub fn module_names(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, id: &ModuleId) -> Result<ModuleHandle, LoadError> {
        let module = self
            .modules
            .get(id.name())
            .ok_or_else(|| LoadError::NotFound(id.clone()))?;
        let available = module.id();

        if let (Some(requested), Some(actual)) = (id.version(), available.version()) {
            if requested != actual {
                return Err(LoadError::VersionMismatch {
                    requested: id.clone(),
                    available: actual.to_string(),
                });
            }
        }
        if let (Some(requested), Some(actual)) = (id.publisher(), available.publisher()) {
            if requested != actual {
                return Err(LoadError::PublisherMismatch {
                    requested: id.clone(),
                    available: actual.to_string(),
                });
            }
        }

        debug!(
            "event=module_load module=loader status=ok requested={} resolved={}",
            id, available
        );
        Ok(module.clone())
    }
}

/// Catalog registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    DuplicateModule(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateModule(name) => write!(f, "module already registered: {name}"),
        }
    }
}

impl Error for CatalogError {}
