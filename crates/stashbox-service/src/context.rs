//! Request context carrying the acting user and the workspace they act in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for the current request.
///
/// Built by the caller after its authorization gate has admitted the user
/// to the workspace. Every service method scopes its queries by
/// `workspace_id`, so rows of other workspaces behave as if they did not
/// exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Workspace (tenant) the request operates on.
    pub workspace_id: Uuid,
    /// The acting user's ID.
    pub user_id: Uuid,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(workspace_id: Uuid, user_id: Uuid) -> Self {
        Self {
            workspace_id,
            user_id,
        }
    }

    /// Context for maintenance tasks run by an operator rather than a user.
    pub fn system(workspace_id: Uuid) -> Self {
        Self::new(workspace_id, Uuid::nil())
    }
}
