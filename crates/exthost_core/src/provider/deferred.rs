//! Deferred export handles.
//!
//! # Invariants
//! - Creating a handle never runs a factory.
//! - Forcing is the only point where construction errors surface, and they
//!   stay scoped to the one export being forced.

use crate::composition::{ContractKey, ExportDefinition, ExportError};
use crate::module::ModuleId;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

/// Forceable handle to one export of contract `T`.
pub struct Deferred<T: ?Sized> {
    definition: Arc<ExportDefinition>,
    _contract: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Deferred<T> {
    pub(crate) fn new(definition: Arc<ExportDefinition>) -> Self {
        Self {
            definition,
            _contract: PhantomData,
        }
    }

    /// Constructs or reuses the export's instance.
    pub fn force(&self) -> Result<Arc<T>, ExportError> {
        self.definition.instance::<T>()
    }

    /// Whether the underlying export already holds an instance.
    pub fn is_value_created(&self) -> bool {
        self.definition.is_value_created()
    }

    /// Module that contributed this export.
    pub fn origin(&self) -> &ModuleId {
        self.definition.origin()
    }

    pub fn contract(&self) -> ContractKey {
        self.definition.contract()
    }

    pub fn definition(&self) -> &Arc<ExportDefinition> {
        &self.definition
    }
}

impl<T: ?Sized> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            _contract: PhantomData,
        }
    }
}

impl<T: ?Sized> Debug for Deferred<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("definition", &self.definition)
            .finish()
    }
}

/// Deferred export paired with its decoded metadata view.
pub struct DeferredWithMetadata<T: ?Sized, M> {
    deferred: Deferred<T>,
    metadata: M,
}

impl<T: ?Sized + Send + Sync + 'static, M> DeferredWithMetadata<T, M> {
    pub(crate) fn new(definition: Arc<ExportDefinition>, metadata: M) -> Self {
        Self {
            deferred: Deferred::new(definition),
            metadata,
        }
    }

    pub fn force(&self) -> Result<Arc<T>, ExportError> {
        self.deferred.force()
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn deferred(&self) -> &Deferred<T> {
        &self.deferred
    }

    pub fn is_value_created(&self) -> bool {
        self.deferred.is_value_created()
    }

    pub fn origin(&self) -> &ModuleId {
        self.deferred.origin()
    }

    pub fn into_parts(self) -> (Deferred<T>, M) {
        (self.deferred, self.metadata)
    }
}

impl<T: ?Sized, M: Clone> Clone for DeferredWithMetadata<T, M> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

impl<T: ?Sized, M: Debug> Debug for DeferredWithMetadata<T, M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredWithMetadata")
            .field("deferred", &self.deferred)
            .field("metadata", &self.metadata)
            .finish()
    }
}
