//! Authorization capability.
//!
//! Role and membership checks live outside the core. Every core operation is
//! preceded by a call to an injected [`Authorizer`], which answers allow or
//! deny for a principal, a resource and an action.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::DbId;

/// The thing being acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Project(DbId),
    Workspace(DbId),
    Run(DbId),
    StateVersion(DbId),
}

/// What the principal wants to do with the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Lock,
    Approve,
    /// Executor progress reports.
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, principal: DbId, resource: Resource, action: Action) -> Decision;
}

/// Ask `authorizer` and turn a deny into [`CoreError::Forbidden`].
pub async fn require(
    authorizer: &dyn Authorizer,
    principal: DbId,
    resource: Resource,
    action: Action,
) -> Result<(), CoreError> {
    match authorizer.authorize(principal, resource, action).await {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(CoreError::Forbidden(format!(
            "{action:?} not permitted on {resource:?}"
        ))),
    }
}

/// Allows every authenticated principal.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAuthenticated;

#[async_trait]
impl Authorizer for AllowAuthenticated {
    async fn authorize(&self, _principal: DbId, _resource: Resource, _action: Action) -> Decision {
        Decision::Allow
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use uuid::Uuid;

    use super::*;

    struct ReadOnly;

    #[async_trait]
    impl Authorizer for ReadOnly {
        async fn authorize(&self, _: DbId, _: Resource, action: Action) -> Decision {
            if action == Action::Read {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
    }

    #[tokio::test]
    async fn allow_authenticated_allows_everything() {
        let id = Uuid::new_v4();
        assert!(require(&AllowAuthenticated, id, Resource::Workspace(id), Action::Lock)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn deny_becomes_forbidden() {
        let id = Uuid::new_v4();
        assert!(require(&ReadOnly, id, Resource::Run(id), Action::Read).await.is_ok());
        assert_matches!(
            require(&ReadOnly, id, Resource::Run(id), Action::Approve).await,
            Err(CoreError::Forbidden(_))
        );
    }
}
