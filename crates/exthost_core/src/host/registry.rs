//! Registry: one immutable composition context behind the export provider.

use crate::composition::CompositionContext;
use crate::host::workspace::WorkspaceServices;
use crate::host::{load_available_modules, ConfigurationError};
use crate::module::{ModuleHandle, ModuleId, ModuleLoader};
use crate::provider::ExportProvider;
use log::info;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Host capable of creating per-workspace service views.
pub trait HostServices: ExportProvider + Sized {
    fn create_workspace_services(self: Arc<Self>, workspace: &str) -> WorkspaceServices<Self> {
        WorkspaceServices::new(self, workspace)
    }
}

/// Extension registry over exactly one composition context.
///
/// Read-only after construction and safe to share across threads.
pub struct Registry {
    context: Arc<CompositionContext>,
}

impl Registry {
    /// Wraps an existing context. A context is mandatory; the type system
    /// rules out the missing case, so this cannot fail.
    pub fn new(context: Arc<CompositionContext>) -> Self {
        info!(
            "event=registry_create module=host status=ok context_id={} modules={} exports={}",
            context.id(),
            context.modules().len(),
            context.export_count()
        );
        Self { context }
    }

    /// Composes already loaded modules.
    pub fn from_modules(modules: Vec<ModuleHandle>) -> Self {
        Self::new(Arc::new(CompositionContext::new(modules)))
    }

    /// Loads `ids` through `loader` and composes the modules that loaded.
    ///
    /// # Errors
    /// - `EmptyModuleList` when `ids` is empty; checked before any load.
    pub fn from_module_ids(
        ids: &[ModuleId],
        loader: &dyn ModuleLoader,
    ) -> Result<Self, ConfigurationError> {
        if ids.is_empty() {
            return Err(ConfigurationError::EmptyModuleList);
        }
        Ok(Self::from_modules(load_available_modules(ids, loader)))
    }

    /// Parses `names` as module identifiers, then behaves like
    /// [`Registry::from_module_ids`].
    ///
    /// # Errors
    /// - `EmptyModuleList` when `names` is empty.
    /// - `InvalidModuleId` for the first name that fails to parse.
    pub fn from_module_names(
        names: &[&str],
        loader: &dyn ModuleLoader,
    ) -> Result<Self, ConfigurationError> {
        if names.is_empty() {
            return Err(ConfigurationError::EmptyModuleList);
        }
        let ids = names
            .iter()
            .map(|name| ModuleId::parse(name))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_module_ids(&ids, loader)
    }

    pub fn context(&self) -> &Arc<CompositionContext> {
        &self.context
    }
}

impl ExportProvider for Registry {
    fn composition(&self) -> &CompositionContext {
        &self.context
    }
}

impl HostServices for Registry {}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::host::ConfigurationError;
    use crate::module::{LoadError, ModuleHandle, ModuleId, ModuleLoader, StaticModuleLoader};
    use crate::provider::ExportProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
    }

    impl ModuleLoader for CountingLoader {
        fn load(&self, id: &ModuleId) -> Result<ModuleHandle, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            StaticModuleLoader::new().load(id)
        }
    }

    trait Unimplemented: Send + Sync {}

    #[test]
    fn empty_identifier_list_fails_before_loading() {
        let loader = CountingLoader {
            calls: AtomicUsize::new(0),
        };
        let err = Registry::from_module_ids(&[], &loader).expect_err("empty list must fail");
        assert_eq!(err, ConfigurationError::EmptyModuleList);
        let err = Registry::from_module_names(&[], &loader).expect_err("empty list must fail");
        assert_eq!(err, ConfigurationError::EmptyModuleList);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_name_fails_before_loading() {
        let loader = CountingLoader {
            calls: AtomicUsize::new(0),
        };
        let err = Registry::from_module_names(&["exthost.ok", "Not Valid"], &loader)
            .expect_err("invalid name must fail");
        assert!(matches!(err, ConfigurationError::InvalidModuleId(_)));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unloadable_modules_leave_a_usable_registry() {
        let loader = CountingLoader {
            calls: AtomicUsize::new(0),
        };
        let registry = Registry::from_module_names(&["exthost.missing"], &loader)
            .expect("load failures are not configuration errors");
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(registry.context().modules().is_empty());
        assert_eq!(registry.get_exports::<dyn Unimplemented>().count(), 0);
    }
}
