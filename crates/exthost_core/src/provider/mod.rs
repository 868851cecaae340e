//! Export provider: the query surface over a composition context.
//!
//! # Responsibility
//! - Turn contract lookups into deferred handles callers force on demand.
//! - Offer the batched metadata query as a one-shot import.
//!
//! # Invariants
//! - Queries never fail; an unknown contract yields an empty result.
//! - Each query re-walks the live context; nothing is cached across calls.
//! - Plain queries resolve lazily while iterated; metadata queries resolve
//!   the matching set eagerly. Construction is deferred in both.

use crate::composition::{CompositionContext, ContractKey, ExportDefinition};
use serde::de::DeserializeOwned;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::slice;
use std::sync::Arc;

mod deferred;
mod import_many;

pub use deferred::{Deferred, DeferredWithMetadata};
pub use import_many::ImportMany;

/// Query surface answering "all exports implementing contract `T`".
pub trait ExportProvider {
    fn composition(&self) -> &CompositionContext;

    /// Deferred handles for every export of `T`, in enumeration order.
    fn get_exports<T>(&self) -> Exports<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Exports::new(self.composition().lookup(ContractKey::of::<T>()))
    }

    /// Deferred handles for exports of `T` whose metadata satisfies `M`.
    fn get_exports_with_metadata<T, M>(&self) -> Vec<DeferredWithMetadata<T, M>>
    where
        T: ?Sized + Send + Sync + 'static,
        M: DeserializeOwned,
    {
        let mut import = ImportMany::<T, M>::new();
        self.composition().satisfy_imports(&mut import);
        import.into_exports()
    }
}

/// Lazy sequence of deferred exports borrowed from a context.
pub struct Exports<'a, T: ?Sized> {
    inner: slice::Iter<'a, Arc<ExportDefinition>>,
    _contract: PhantomData<fn() -> Arc<T>>,
}

impl<'a, T: ?Sized + Send + Sync + 'static> Exports<'a, T> {
    fn new(definitions: &'a [Arc<ExportDefinition>]) -> Self {
        Self {
            inner: definitions.iter(),
            _contract: PhantomData,
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Iterator for Exports<'_, T> {
    type Item = Deferred<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|definition| Deferred::new(Arc::clone(definition)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: ?Sized + Send + Sync + 'static> ExactSizeIterator for Exports<'_, T> {}

impl<T: ?Sized + Send + Sync + 'static> FusedIterator for Exports<'_, T> {}
