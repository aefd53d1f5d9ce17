use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ActorId, RoleId};

/// Username carried by the empty session context.
pub const NO_ACTOR_USERNAME: &str = "no-actor";

/// Resolved identity of the caller, attached once per authenticated request.
///
/// Instances are immutable; authentication creates them and every other layer
/// only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    actor_id: ActorId,
    username: String,
    role_id: RoleId,
}

impl SessionContext {
    /// Session storage key under which the context is persisted.
    pub const SESSION_KEY: &'static str = "session_context";

    /// Creates a session context from authentication data.
    #[must_use]
    pub fn new(actor_id: ActorId, username: impl Into<String>, role_id: RoleId) -> Self {
        Self {
            actor_id,
            username: username.into(),
            role_id,
        }
    }

    /// Returns the sentinel context used when security is globally disabled.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            actor_id: ActorId::from_uuid(Uuid::nil()),
            username: NO_ACTOR_USERNAME.to_owned(),
            role_id: RoleId::from_uuid(Uuid::nil()),
        }
    }

    /// Returns whether this is the sentinel context.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actor_id.as_uuid().is_nil() && self.role_id.is_nil()
    }

    /// Returns the actor identifier.
    #[must_use]
    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    /// Returns the actor username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the role assigned to the actor at authentication time.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }
}
