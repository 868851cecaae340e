//! Import definitions satisfied by a composition context in one shot.

use crate::composition::contract::ContractKey;
use crate::composition::export::ExportDefinition;
use std::sync::Arc;

/// A declared need for exports of one contract.
///
/// The context hands every candidate to `satisfy` in a single call, so the
/// import decides multiplicity and filtering eagerly while instance
/// construction stays deferred.
pub trait ImportDefinition {
    fn contract(&self) -> ContractKey;

    fn satisfy(&mut self, candidates: &[Arc<ExportDefinition>]);
}
