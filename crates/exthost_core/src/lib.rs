//! Host-side extension registry.
//! Modules contribute typed exports; the registry composes them once and
//! serves lazy, metadata-filtered lookups to every caller in the process.

pub mod composition;
pub mod host;
pub mod logging;
pub mod module;
pub mod provider;

pub use composition::{
    CompositionContext, CompositionIssue, ContractKey, ExportDeclaration, ExportDefinition,
    ExportError, ExportMetadata, FactoryError,
};
pub use host::{
    default_registry, install_default_module_loader, ConfigurationError, HostServices, Registry,
    WorkspaceServices,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use module::{
    ExtensionModule, LoadError, ModuleError, ModuleHandle, ModuleId, ModuleIdError, ModuleLoader,
    StaticModule, StaticModuleLoader,
};
pub use provider::{Deferred, DeferredWithMetadata, ExportProvider, Exports};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
