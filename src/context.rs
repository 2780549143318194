//! Per-request organization context.
//!
//! Every store call takes an explicit `OrgContext` instead of reading
//! ambient request state. Stores are expected to scope all reads and
//! writes to `organization_id`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgContext {
    pub organization_id: String,
    pub user_id: String,
    /// IANA timezone name for the organization, e.g. "Asia/Dubai".
    /// All dates and times in this crate are naive local values in this
    /// timezone; the context carries the label for callers that need it.
    pub timezone: String,
}

impl OrgContext {
    pub fn new(
        organization_id: impl Into<String>,
        user_id: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            user_id: user_id.into(),
            timezone: timezone.into(),
        }
    }
}
