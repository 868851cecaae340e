//! Batched "many exports with metadata" import.

use crate::composition::{ContractKey, ExportDefinition, ImportDefinition};
use crate::provider::deferred::DeferredWithMetadata;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Import of every export of `T` whose metadata satisfies shape `M`.
///
/// Satisfied in one call: which exports match, and their metadata, is fixed
/// when the context satisfies the import. Instances are still built lazily.
pub struct ImportMany<T: ?Sized, M> {
    exports: Vec<DeferredWithMetadata<T, M>>,
    satisfied: bool,
}

impl<T: ?Sized + Send + Sync + 'static, M: DeserializeOwned> ImportMany<T, M> {
    pub fn new() -> Self {
        Self {
            exports: Vec::new(),
            satisfied: false,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    pub fn exports(&self) -> &[DeferredWithMetadata<T, M>] {
        &self.exports
    }

    pub fn into_exports(self) -> Vec<DeferredWithMetadata<T, M>> {
        self.exports
    }
}

impl<T: ?Sized + Send + Sync + 'static, M: DeserializeOwned> Default for ImportMany<T, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Send + Sync + 'static, M: DeserializeOwned> ImportDefinition
    for ImportMany<T, M>
{
    fn contract(&self) -> ContractKey {
        ContractKey::of::<T>()
    }

    fn satisfy(&mut self, candidates: &[Arc<ExportDefinition>]) {
        self.exports = candidates
            .iter()
            .filter_map(|definition| {
                let view = definition.metadata()?.view::<M>()?;
                Some(DeferredWithMetadata::new(Arc::clone(definition), view))
            })
            .collect();
        self.satisfied = true;
    }
}
