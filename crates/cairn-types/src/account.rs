//! Account entity.
//!
//! Accounts exist so capsules have an owner to guard against and so the share
//! view can surface an author's display name. Credential issuance and
//! verification live at the daemon boundary; the access token column never
//! appears in this type.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::AccountId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub display_name: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}
