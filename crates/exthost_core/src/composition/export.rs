//! Export declarations and composed export definitions.
//!
//! # Responsibility
//! - Let modules declare `(contract, metadata, factory)` triples explicitly.
//! - Hold the per-export shared instance once an export is composed.
//!
//! # Invariants
//! - A composed export's contract never changes after composition.
//! - Each composed export constructs at most one live instance; a failed
//!   construction is not cached and is retried by the next force.
//! - Factories must not force their own export (no cycle resolution).

use crate::composition::contract::ContractKey;
use crate::composition::metadata::{ExportMetadata, MetadataError};
use crate::module::ModuleId;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::any::Any;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Result of one factory invocation.
pub type FactoryResult<T> = Result<Arc<T>, FactoryError>;

type Factory<T> = Arc<dyn Fn() -> FactoryResult<T> + Send + Sync>;

/// Type-erased factory producing instances of one contract.
#[derive(Clone)]
pub struct ExportFactory {
    produces: ContractKey,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ExportFactory {
    pub fn new<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> FactoryResult<T> + Send + Sync + 'static,
    {
        let factory: Factory<T> = Arc::new(factory);
        Self {
            produces: ContractKey::of::<T>(),
            inner: Arc::new(factory),
        }
    }

    /// Contract of the instances this factory produces.
    pub fn produces(&self) -> ContractKey {
        self.produces
    }

    fn typed<T: ?Sized + Send + Sync + 'static>(&self) -> Option<&Factory<T>> {
        self.inner.downcast_ref::<Factory<T>>()
    }
}

impl Debug for ExportFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportFactory")
            .field("produces", &self.produces.type_name())
            .finish()
    }
}

#[derive(Debug, Clone)]
enum DeclaredMetadata {
    Absent,
    Record(ExportMetadata),
    Invalid(MetadataError),
}

/// One extension contribution as declared by a module.
#[derive(Debug, Clone)]
pub struct ExportDeclaration {
    contract: ContractKey,
    metadata: DeclaredMetadata,
    factory: ExportFactory,
}

impl ExportDeclaration {
    /// Declares an export of contract `T` built by `factory`.
    pub fn new<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> FactoryResult<T> + Send + Sync + 'static,
    {
        Self::from_factory(ContractKey::of::<T>(), ExportFactory::new(factory))
    }

    /// Declares an export of contract `T` backed by an existing instance.
    pub fn from_instance<T>(instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self::new::<T, _>(move || Ok(Arc::clone(&instance)))
    }

    /// Declares an export from an already erased factory.
    ///
    /// Used by modules that build declarations from tables; the declared
    /// contract must match `factory.produces()` or the export is rejected
    /// during composition.
    pub fn from_factory(contract: ContractKey, factory: ExportFactory) -> Self {
        Self {
            contract,
            metadata: DeclaredMetadata::Absent,
            factory,
        }
    }

    /// Attaches metadata from any value that serializes to an object record.
    ///
    /// Invalid metadata is recorded, not raised; composition skips the export.
    pub fn with_metadata<S: Serialize + ?Sized>(mut self, metadata: &S) -> Self {
        self.metadata = match ExportMetadata::from_serializable(metadata) {
            Ok(record) => DeclaredMetadata::Record(record),
            Err(err) => DeclaredMetadata::Invalid(err),
        };
        self
    }

    pub fn with_metadata_record(mut self, metadata: ExportMetadata) -> Self {
        self.metadata = DeclaredMetadata::Record(metadata);
        self
    }

    pub fn contract(&self) -> ContractKey {
        self.contract
    }

    pub fn metadata(&self) -> Option<&ExportMetadata> {
        match &self.metadata {
            DeclaredMetadata::Record(record) => Some(record),
            DeclaredMetadata::Absent | DeclaredMetadata::Invalid(_) => None,
        }
    }

    /// Checks declaration-level structure.
    pub fn validate(&self) -> Result<(), DeclarationError> {
        if self.factory.produces() != self.contract {
            return Err(DeclarationError::ContractMismatch {
                declared: self.contract.type_name(),
                produced: self.factory.produces().type_name(),
            });
        }
        if let DeclaredMetadata::Invalid(err) = &self.metadata {
            return Err(DeclarationError::InvalidMetadata(err.clone()));
        }
        Ok(())
    }

    /// Validates and binds this declaration to its contributing module.
    pub(crate) fn compose(self, origin: &ModuleId) -> Result<ExportDefinition, DeclarationError> {
        self.validate()?;
        let metadata = match self.metadata {
            DeclaredMetadata::Record(record) => Some(record),
            DeclaredMetadata::Absent | DeclaredMetadata::Invalid(_) => None,
        };
        Ok(ExportDefinition {
            contract: self.contract,
            origin: origin.clone(),
            metadata,
            factory: self.factory,
            instance: OnceCell::new(),
        })
    }
}

/// An export bound into a composition context.
pub struct ExportDefinition {
    contract: ContractKey,
    origin: ModuleId,
    metadata: Option<ExportMetadata>,
    factory: ExportFactory,
    instance: OnceCell<Box<dyn Any + Send + Sync>>,
}

impl ExportDefinition {
    pub fn contract(&self) -> ContractKey {
        self.contract
    }

    /// Module that contributed this export.
    pub fn origin(&self) -> &ModuleId {
        &self.origin
    }

    pub fn metadata(&self) -> Option<&ExportMetadata> {
        self.metadata.as_ref()
    }

    pub fn is_value_created(&self) -> bool {
        self.instance.get().is_some()
    }

    /// Returns the shared instance, constructing it on first use.
    pub(crate) fn instance<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ExportError> {
        let mismatch = || ExportError::ContractMismatch {
            requested: ContractKey::of::<T>().type_name(),
            declared: self.contract.type_name(),
            origin: self.origin.clone(),
        };
        let factory = self.factory.typed::<T>().ok_or_else(mismatch)?;
        let slot = self
            .instance
            .get_or_try_init(|| {
                factory().map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
            })
            .map_err(|source| ExportError::Construction {
                contract: self.contract.type_name(),
                origin: self.origin.clone(),
                source,
            })?;
        slot.downcast_ref::<Arc<T>>().cloned().ok_or_else(mismatch)
    }
}

impl Debug for ExportDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDefinition")
            .field("contract", &self.contract.type_name())
            .field("origin", &self.origin.to_string())
            .field("metadata", &self.metadata)
            .field("value_created", &self.is_value_created())
            .finish()
    }
}

/// Failure reported by an export factory.
#[derive(Debug)]
pub struct FactoryError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl FactoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for FactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn Error + 'static))
    }
}

/// Structurally invalid export declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    ContractMismatch {
        declared: &'static str,
        produced: &'static str,
    },
    InvalidMetadata(MetadataError),
}

impl Display for DeclarationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContractMismatch { declared, produced } => write!(
                f,
                "export declares contract {declared} but its factory produces {produced}"
            ),
            Self::InvalidMetadata(err) => write!(f, "export metadata is invalid: {err}"),
        }
    }
}

impl Error for DeclarationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidMetadata(err) => Some(err),
            Self::ContractMismatch { .. } => None,
        }
    }
}

/// Errors raised when forcing a deferred export.
#[derive(Debug)]
pub enum ExportError {
    Construction {
        contract: &'static str,
        origin: ModuleId,
        source: FactoryError,
    },
    ContractMismatch {
        requested: &'static str,
        declared: &'static str,
        origin: ModuleId,
    },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Construction {
                contract,
                origin,
                source,
            } => write!(
                f,
                "export {contract} from module {origin} failed to construct: {source}"
            ),
            Self::ContractMismatch {
                requested,
                declared,
                origin,
            } => write!(
                f,
                "export from module {origin} declares {declared}, requested as {requested}"
            ),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Construction { source, .. } => Some(source),
            Self::ContractMismatch { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeclarationError, ExportDeclaration, ExportError, ExportFactory, FactoryError};
    use crate::composition::contract::ContractKey;
    use crate::module::ModuleId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    trait Unrelated {}

    fn origin() -> ModuleId {
        ModuleId::new("exthost.test").expect("valid module id")
    }

    #[test]
    fn constructs_once_and_reuses_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let definition = ExportDeclaration::new::<dyn Greeter, _>(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(English) as Arc<dyn Greeter>)
        })
        .compose(&origin())
        .expect("valid declaration");

        assert!(!definition.is_value_created());
        let first = definition.instance::<dyn Greeter>().expect("first force");
        let second = definition.instance::<dyn Greeter>().expect("second force");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.greet(), "hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(definition.is_value_created());
    }

    #[test]
    fn failed_construction_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let definition = ExportDeclaration::new::<dyn Greeter, _>(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(FactoryError::new("warming up"))
            } else {
                Ok(Arc::new(English) as Arc<dyn Greeter>)
            }
        })
        .compose(&origin())
        .expect("valid declaration");

        let err = definition
            .instance::<dyn Greeter>()
            .err()
            .expect("first force fails");
        assert!(matches!(err, ExportError::Construction { .. }));
        assert!(err.to_string().contains("warming up"));
        definition
            .instance::<dyn Greeter>()
            .expect("second force succeeds");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn rejects_contract_mismatch() {
        let factory =
            ExportFactory::new::<dyn Greeter, _>(|| Ok(Arc::new(English) as Arc<dyn Greeter>));
        let declaration =
            ExportDeclaration::from_factory(ContractKey::of::<dyn Unrelated>(), factory);
        let err = declaration.validate().expect_err("mismatch must fail");
        assert!(matches!(err, DeclarationError::ContractMismatch { .. }));
    }

    #[test]
    fn rejects_scalar_metadata() {
        let declaration = ExportDeclaration::from_instance::<dyn Greeter>(Arc::new(English))
            .with_metadata(&42);
        assert!(declaration.metadata().is_none());
        let err = declaration.validate().expect_err("scalar metadata must fail");
        assert!(matches!(err, DeclarationError::InvalidMetadata(_)));
    }

    #[test]
    fn forcing_with_wrong_contract_reports_mismatch() {
        let definition = ExportDeclaration::from_instance::<dyn Greeter>(Arc::new(English))
            .compose(&origin())
            .expect("valid declaration");
        let err = definition
            .instance::<String>()
            .expect_err("wrong contract must fail");
        assert!(matches!(err, ExportError::ContractMismatch { .. }));
    }
}
