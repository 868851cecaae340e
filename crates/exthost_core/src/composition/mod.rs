//! Composition engine: contracts, export declarations and the export index.
//!
//! # Responsibility
//! - Turn module export declarations into an immutable contract index.
//! - Keep instance construction deferred until a caller forces an export.
//!
//! # Invariants
//! - Every export's contract is fixed at composition time.
//! - One composed export owns at most one live instance.

pub mod context;
pub mod contract;
pub mod export;
pub mod import;
pub mod metadata;

pub use context::{CompositionContext, CompositionIssue};
pub use contract::ContractKey;
pub use export::{
    DeclarationError, ExportDeclaration, ExportDefinition, ExportError, ExportFactory,
    FactoryError, FactoryResult,
};
pub use import::ImportDefinition;
pub use metadata::{ExportMetadata, MetadataError};
