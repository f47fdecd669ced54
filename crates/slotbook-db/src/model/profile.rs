use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};

use slotbook_core::scheduling::SchedulingProfile;

use crate::db::{enums::ProfileType, schema};

/// Stored scheduling profile.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = schema::profiles)]
#[diesel(check_for_backend(Pg))]
pub struct ProfileRow {
    pub id: uuid::Uuid,
    pub external_user_id: String,
    pub profile_type: ProfileType,
    pub display_name: Option<String>,
    pub business_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for SchedulingProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            external_user_id: row.external_user_id,
            profile_type: row.profile_type.into(),
            display_name: row.display_name,
            business_name: row.business_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&SchedulingProfile> for ProfileRow {
    fn from(profile: &SchedulingProfile) -> Self {
        Self {
            id: profile.id,
            external_user_id: profile.external_user_id.clone(),
            profile_type: profile.profile_type.into(),
            display_name: profile.display_name.clone(),
            business_name: profile.business_name.clone(),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}
