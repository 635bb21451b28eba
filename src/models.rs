use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Ownership tuple scoping every record for multi-tenant isolation.
///
/// Passed explicitly into pipeline and engine calls; there is no ambient
/// request context in this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOwner {
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
}

impl ResourceOwner {
    pub fn new(tenant_id: Uuid, client_id: Uuid, group_id: Uuid, user_id: Uuid) -> Self {
        Self {
            tenant_id,
            client_id,
            group_id,
            user_id,
        }
    }
}

/// Buckets the parser can contribute extracted entities into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    PlayerMetadata,
    Match,
    Team,
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::PlayerMetadata => "PlayerMetadata",
            ResourceType::Match => "Match",
            ResourceType::Team => "Team",
        }
    }
}

/// Cooperative cancellation flag threaded through long-running calls.
///
/// The pipeline checks it in the drain loop and the engine checks it between
/// analyzers and hooks. A tripped flag is treated the same as a parse/hook
/// failure: the operation aborts without a partial result.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
