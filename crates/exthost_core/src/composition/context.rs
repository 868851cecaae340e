//! Composition context: the export index built from loaded modules.
//!
//! # Responsibility
//! - Scan module handles once and index every valid export by contract.
//! - Answer plain, metadata-filtered and batched-import lookups.
//!
//! # Invariants
//! - The module set and index never change after construction.
//! - Enumeration order is module order, then declaration order, and is stable
//!   for the lifetime of the context.
//! - Construction never fails: a bad module or export is skipped and recorded.

use crate::composition::contract::ContractKey;
use crate::composition::export::{DeclarationError, ExportDefinition};
use crate::composition::import::ImportDefinition;
use crate::module::{ModuleError, ModuleHandle, ModuleId};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Something composition skipped instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositionIssue {
    /// The module's export enumeration failed; it contributes nothing.
    ModuleSkipped(ModuleError),
    /// The same module id was supplied more than once.
    DuplicateModule(ModuleId),
    /// One declaration was structurally invalid.
    ExportSkipped {
        module: ModuleId,
        position: usize,
        error: DeclarationError,
    },
}

impl Display for CompositionIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModuleSkipped(err) => write!(f, "{err}"),
            Self::DuplicateModule(id) => write!(f, "module supplied more than once: {id}"),
            Self::ExportSkipped {
                module,
                position,
                error,
            } => write!(f, "export #{position} of module {module} skipped: {error}"),
        }
    }
}

/// Immutable index of all exports contributed by a set of modules.
pub struct CompositionContext {
    id: Uuid,
    modules: Vec<ModuleId>,
    contracts: Vec<ContractKey>,
    index: HashMap<ContractKey, Vec<Arc<ExportDefinition>>>,
    export_count: usize,
    issues: Vec<CompositionIssue>,
}

impl CompositionContext {
    /// Builds the index from `modules` in the given order.
    pub fn new(modules: Vec<ModuleHandle>) -> Self {
        let started_at = Instant::now();
        let id = Uuid::new_v4();
        info!(
            "event=composition_build module=composition status=start context_id={} modules={}",
            id,
            modules.len()
        );

        let mut seen = HashSet::new();
        let mut composed_modules = Vec::with_capacity(modules.len());
        let mut contracts = Vec::new();
        let mut index: HashMap<ContractKey, Vec<Arc<ExportDefinition>>> = HashMap::new();
        let mut export_count = 0;
        let mut issues = Vec::new();

        for module in modules {
            let module_id = module.id().clone();
            if !seen.insert(module_id.clone()) {
                warn!(
                    "event=module_scan module=composition status=skipped context_id={} module_id={} reason=duplicate",
                    id, module_id
                );
                issues.push(CompositionIssue::DuplicateModule(module_id));
                continue;
            }

            let declarations = match module.exports() {
                Ok(declarations) => declarations,
                Err(err) => {
                    warn!(
                        "event=module_scan module=composition status=skipped context_id={} module_id={} error={}",
                        id, module_id, err
                    );
                    issues.push(CompositionIssue::ModuleSkipped(err));
                    continue;
                }
            };

            let mut accepted = 0;
            for (position, declaration) in declarations.into_iter().enumerate() {
                match declaration.compose(&module_id) {
                    Ok(definition) => {
                        let contract = definition.contract();
                        let bucket = index.entry(contract).or_default();
                        if bucket.is_empty() {
                            contracts.push(contract);
                        }
                        bucket.push(Arc::new(definition));
                        accepted += 1;
                    }
                    Err(error) => {
                        warn!(
                            "event=export_scan module=composition status=skipped context_id={} module_id={} position={} error={}",
                            id, module_id, position, error
                        );
                        issues.push(CompositionIssue::ExportSkipped {
                            module: module_id.clone(),
                            position,
                            error,
                        });
                    }
                }
            }

            debug!(
                "event=module_scan module=composition status=ok context_id={} module_id={} exports={}",
                id, module_id, accepted
            );
            export_count += accepted;
            composed_modules.push(module_id);
        }

        info!(
            "event=composition_build module=composition status=ok context_id={} modules={} exports={} contracts={} skipped={} duration_ms={}",
            id,
            composed_modules.len(),
            export_count,
            contracts.len(),
            issues.len(),
            started_at.elapsed().as_millis()
        );

        Self {
            id,
            modules: composed_modules,
            contracts,
            index,
            export_count,
            issues,
        }
    }

    /// Context built from no modules; every lookup is empty.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Unique id of this context instance, used in diagnostics.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Exports registered for `contract`, in enumeration order.
    pub fn lookup(&self, contract: ContractKey) -> &[Arc<ExportDefinition>] {
        self.index
            .get(&contract)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Exports for `contract` whose metadata satisfies shape `M`, paired with
    /// the decoded metadata. Exports without metadata are excluded.
    pub fn lookup_with_metadata<M: DeserializeOwned>(
        &self,
        contract: ContractKey,
    ) -> Vec<(Arc<ExportDefinition>, M)> {
        self.lookup(contract)
            .iter()
            .filter_map(|definition| {
                let view = definition.metadata()?.view::<M>()?;
                Some((Arc::clone(definition), view))
            })
            .collect()
    }

    /// Satisfies `import` against this context in one pass.
    pub fn satisfy_imports<I: ImportDefinition + ?Sized>(&self, import: &mut I) {
        let contract = import.contract();
        let candidates = self.lookup(contract);
        import.satisfy(candidates);
        debug!(
            "event=import_satisfy module=composition status=ok context_id={} contract={} candidates={}",
            self.id,
            contract,
            candidates.len()
        );
    }

    /// Modules that were composed, in order.
    pub fn modules(&self) -> &[ModuleId] {
        &self.modules
    }

    pub fn export_count(&self) -> usize {
        self.export_count
    }

    /// Contracts with their export counts, in first-seen order.
    pub fn contracts(&self) -> Vec<(ContractKey, usize)> {
        self.contracts
            .iter()
            .map(|contract| (*contract, self.lookup(*contract).len()))
            .collect()
    }

    /// Modules and exports skipped during construction.
    pub fn issues(&self) -> &[CompositionIssue] {
        &self.issues
    }
}

impl Debug for CompositionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionContext")
            .field("id", &self.id)
            .field("modules", &self.modules)
            .field("export_count", &self.export_count)
            .field("issues", &self.issues.len())
            .finish()
    }
}
