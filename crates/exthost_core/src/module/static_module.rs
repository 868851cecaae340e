//! In-process module built from an explicit declaration list.

use crate::composition::{ExportDeclaration, FactoryResult};
use crate::module::{ExtensionModule, ModuleError, ModuleId};
use serde::Serialize;
use std::sync::Arc;

/// Module whose exports are registered in code.
///
/// Built-in modules and test fixtures use this; a dynamic loader would provide
/// its own `ExtensionModule` implementation.
#[derive(Debug, Clone)]
pub struct StaticModule {
    id: ModuleId,
    exports: Vec<ExportDeclaration>,
}

impl StaticModule {
    pub fn new(id: ModuleId) -> Self {
        Self {
            id,
            exports: Vec::new(),
        }
    }

    /// Adds an export of contract `T`.
    pub fn export<T, F>(mut self, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> FactoryResult<T> + Send + Sync + 'static,
    {
        self.exports.push(ExportDeclaration::new::<T, F>(factory));
        self
    }

    /// Adds an export of contract `T` with attached metadata.
    pub fn export_with_metadata<T, F, S>(mut self, metadata: &S, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> FactoryResult<T> + Send + Sync + 'static,
        S: Serialize + ?Sized,
    {
        self.exports
            .push(ExportDeclaration::new::<T, F>(factory).with_metadata(metadata));
        self
    }

    /// Adds a prebuilt declaration as-is.
    pub fn declare(mut self, declaration: ExportDeclaration) -> Self {
        self.exports.push(declaration);
        self
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    pub fn into_handle(self) -> Arc<dyn ExtensionModule> {
        Arc::new(self)
    }
}

impl ExtensionModule for StaticModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn exports(&self) -> Result<Vec<ExportDeclaration>, ModuleError> {
        Ok(self.exports.clone())
    }
}
