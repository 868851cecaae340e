//! Process-wide default registry.
//!
//! # Responsibility
//! - Resolve the built-in module set against the installed module loader.
//! - Build and publish the default registry exactly once per process.
//!
//! # Invariants
//! - Once published, the default registry is never replaced or torn down.
//! - Racing first callers may each build a candidate; the first successful
//!   install wins and every other candidate is dropped unseen.
//! - A default module that fails to load is left out without an error.

use crate::host::{load_available_modules, ConfigurationError, Registry};
use crate::module::{BuildIdentity, ModuleHandle, ModuleId, ModuleLoader, StaticModuleLoader};
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Built-in modules composed into the default registry, in order.
pub const DEFAULT_MODULE_IDENTIFIERS: &[&str] = &[
    "exthost.workspaces",
    "exthost.workspaces.desktop",
    "exthost.rust.workspaces",
    "exthost.rust.workspaces.desktop",
    "exthost.python.workspaces",
    "exthost.python.workspaces.desktop",
];

static DEFAULT_LOADER: OnceCell<Arc<dyn ModuleLoader>> = OnceCell::new();
static DEFAULT_MODULES: InstallOnce<Vec<ModuleHandle>> = InstallOnce::new("default_modules");
static DEFAULT_REGISTRY: InstallOnce<Registry> = InstallOnce::new("default_registry");

/// Write-once cell published with a first-writer-wins install.
///
/// Unlike `OnceCell::get_or_init`, concurrent first callers do not wait on
/// each other: each may compute a candidate, and losers drop theirs. Builders
/// must therefore be free of side effects other than producing the value.
pub struct InstallOnce<T> {
    name: &'static str,
    cell: OnceCell<Arc<T>>,
}

impl<T> InstallOnce<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
        }
    }

    /// Published value, if any.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    /// Returns the published value, building and installing a candidate
    /// when nothing is published yet.
    pub fn get_or_publish<F: FnOnce() -> T>(&self, build: F) -> Arc<T> {
        if let Some(value) = self.cell.get() {
            return Arc::clone(value);
        }

        let candidate = Arc::new(build());
        match self.cell.try_insert(candidate) {
            Ok(published) => {
                info!(
                    "event=install_once module=defaults status=ok target={}",
                    self.name
                );
                Arc::clone(published)
            }
            Err((published, _discarded)) => {
                debug!(
                    "event=install_once module=defaults status=discarded target={}",
                    self.name
                );
                Arc::clone(published)
            }
        }
    }
}

/// Installs the loader used to resolve default modules.
///
/// Must run before the first default access; afterwards the loader in use is
/// fixed and this returns `LoaderAlreadyInstalled`.
pub fn install_default_module_loader(
    loader: Arc<dyn ModuleLoader>,
) -> Result<(), ConfigurationError> {
    DEFAULT_LOADER
        .set(loader)
        .map_err(|_| ConfigurationError::LoaderAlreadyInstalled)?;
    info!("event=loader_install module=defaults status=ok");
    Ok(())
}

/// Loader used for default modules; an empty catalog when none was installed.
pub fn default_module_loader() -> Arc<dyn ModuleLoader> {
    Arc::clone(DEFAULT_LOADER.get_or_init(|| {
        warn!("event=loader_install module=defaults status=fallback loader=empty_catalog");
        Arc::new(StaticModuleLoader::new())
    }))
}

/// Loads every default module, qualified with the current build identity.
pub fn resolve_default_modules(loader: &dyn ModuleLoader) -> Vec<ModuleHandle> {
    let identity = BuildIdentity::current();
    let ids: Vec<ModuleId> = DEFAULT_MODULE_IDENTIFIERS
        .iter()
        .filter_map(|name| {
            match ModuleId::new(*name).and_then(|id| id.qualified(&identity)) {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!(
                        "event=module_resolve module=defaults status=skipped module_name={} error={}",
                        name, err
                    );
                    None
                }
            }
        })
        .collect();

    let modules = load_available_modules(&ids, loader);
    info!(
        "event=module_resolve module=defaults status=ok requested={} loaded={}",
        ids.len(),
        modules.len()
    );
    modules
}

/// Default module handles, resolved once per process.
pub fn default_modules() -> Arc<Vec<ModuleHandle>> {
    DEFAULT_MODULES.get_or_publish(|| resolve_default_modules(default_module_loader().as_ref()))
}

/// Process-wide registry over the default modules.
pub fn default_registry() -> Arc<Registry> {
    DEFAULT_REGISTRY.get_or_publish(|| Registry::from_modules(default_modules().to_vec()))
}
