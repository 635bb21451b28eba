//! Pluggable anti-cheat integrations.

use crate::integrity::data::ReplayAnalysisData;
use crate::integrity::report::IntegrityViolation;
use anyhow::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// A named external analyzer invoked during integrity analysis.
///
/// Hooks run sequentially so evidence ordering stays deterministic; a hook
/// failure is logged and its partial output discarded without affecting the
/// other hooks.
#[async_trait::async_trait]
pub trait AntiCheatHook: Send + Sync {
    fn name(&self) -> &str;
    async fn analyze(&self, data: &ReplayAnalysisData) -> Result<Vec<IntegrityViolation>>;
}

/// Append-only, thread-safe hook registry owned by the engine instance.
///
/// Registration takes the write lock and is expected to be rare
/// (startup-time); analysis snapshots the list under the read lock.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<Vec<Arc<dyn AntiCheatHook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, hook: Arc<dyn AntiCheatHook>) {
        info!(hook = hook.name(), "anti-cheat hook registered");
        self.hooks.write().push(hook);
    }

    /// Cloned view of the current hook list for one analysis run.
    pub fn snapshot(&self) -> Vec<Arc<dyn AntiCheatHook>> {
        self.hooks.read().clone()
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }
}
