//! Host and guest identities.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::ProfileType;

pub const MAX_PROFILE_NAME_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulingProfile {
    pub id: uuid::Uuid,
    /// Identity of the owning user in the external identity provider.
    pub external_user_id: String,
    pub profile_type: ProfileType,
    pub display_name: Option<String>,
    /// Present iff `profile_type` is `Business`.
    pub business_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SchedulingProfile {
    /// ## Summary
    /// Creates a profile owned by `external_user_id`.
    ///
    /// Per-user uniqueness (one individual profile, distinct business names) is
    /// checked by the caller against the store.
    ///
    /// ## Errors
    /// Returns `ValidationError` if the owner is blank, a business profile has no
    /// business name, an individual profile has one, or a name is too long.
    pub fn create(
        external_user_id: &str,
        profile_type: ProfileType,
        display_name: Option<&str>,
        business_name: Option<&str>,
    ) -> CoreResult<Self> {
        let external_user_id = external_user_id.trim();
        if external_user_id.is_empty() {
            return Err(CoreError::validation("external user id must not be empty"));
        }

        let display_name = clean_name(display_name, "display name")?;
        let business_name = clean_name(business_name, "business name")?;

        match (profile_type, &business_name) {
            (ProfileType::Business, None) => {
                return Err(CoreError::validation(
                    "business profiles require a business name",
                ));
            }
            (ProfileType::Individual, Some(_)) => {
                return Err(CoreError::validation(
                    "individual profiles cannot have a business name",
                ));
            }
            _ => {}
        }

        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::now_v7(),
            external_user_id: external_user_id.to_string(),
            profile_type,
            display_name,
            business_name,
            created_at: now,
            updated_at: now,
        })
    }

    #[must_use]
    pub fn is_owned_by(&self, external_user_id: &str) -> bool {
        self.external_user_id == external_user_id
    }

    /// True when both profiles belong to the same external user.
    #[must_use]
    pub fn shares_owner_with(&self, other: &Self) -> bool {
        self.external_user_id == other.external_user_id
    }

    /// Best human-readable name for the profile.
    #[must_use]
    pub fn label(&self) -> &str {
        self.business_name
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or(&self.external_user_id)
    }
}

fn clean_name(value: Option<&str>, field: &str) -> CoreResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > MAX_PROFILE_NAME_LEN {
        return Err(CoreError::validation(format!(
            "{field} must be at most {MAX_PROFILE_NAME_LEN} characters"
        )));
    }
    Ok(Some(value.to_string()))
}
