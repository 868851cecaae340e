//! Per-workspace view over a host registry.

use crate::composition::CompositionContext;
use crate::host::Registry;
use crate::provider::{DeferredWithMetadata, ExportProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metadata shape for language-specific exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageMetadata {
    pub language: String,
}

/// Services scoped to one workspace, backed by a shared host.
#[derive(Debug)]
pub struct WorkspaceServices<H = Registry> {
    host: Arc<H>,
    workspace: String,
}

impl<H: ExportProvider> WorkspaceServices<H> {
    pub fn new(host: Arc<H>, workspace: &str) -> Self {
        Self {
            host,
            workspace: workspace.trim().to_string(),
        }
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Exports of `T` declared for `language` (ASCII case-insensitive).
    pub fn language_exports<T>(
        &self,
        language: &str,
    ) -> Vec<DeferredWithMetadata<T, LanguageMetadata>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let language = language.trim();
        self.get_exports_with_metadata::<T, LanguageMetadata>()
            .into_iter()
            .filter(|export| export.metadata().language.eq_ignore_ascii_case(language))
            .collect()
    }
}

impl<H: ExportProvider> ExportProvider for WorkspaceServices<H> {
    fn composition(&self) -> &CompositionContext {
        self.host.composition()
    }
}
