//! Profile use cases.

use slotbook_core::scheduling::SchedulingProfile;
use slotbook_core::types::ProfileType;
use slotbook_db::repository::{DeleteOutcome, SchedulingStore, WriteOutcome};

use crate::auth::{AuthContext, require_user};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::scheduling::SchedulingService;

/// Context for profile creation. The owner is the calling user.
#[derive(Debug, Clone)]
pub struct CreateProfileContext {
    pub profile_type: ProfileType,
    pub display_name: Option<String>,
    /// Required for business profiles, rejected for individual ones.
    pub business_name: Option<String>,
}

impl<S: SchedulingStore, C: Clock> SchedulingService<S, C> {
    /// ## Summary
    /// Creates a profile owned by the caller.
    ///
    /// ## Side Effects
    /// - Inserts the profile
    ///
    /// ## Errors
    /// Returns `NotAuthenticated`, `ValidationError` for malformed names, or
    /// `Conflict` when the caller already has an individual profile or a
    /// business profile with the same name.
    #[tracing::instrument(skip(self, auth, ctx), fields(profile_type = %ctx.profile_type))]
    pub async fn create_profile<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        ctx: &CreateProfileContext,
    ) -> ServiceResult<SchedulingProfile> {
        let user_id = require_user(auth)?;
        let profile = SchedulingProfile::create(
            user_id,
            ctx.profile_type,
            ctx.display_name.as_deref(),
            ctx.business_name.as_deref(),
        )?;

        match (profile.profile_type, profile.business_name.as_deref()) {
            (ProfileType::Individual, _) => {
                let existing = self.store.list_profiles_by_owner(user_id).await?;
                if existing
                    .iter()
                    .any(|p| p.profile_type == ProfileType::Individual)
                {
                    return Err(ServiceError::Conflict(
                        "user already has an individual profile".to_string(),
                    ));
                }
            }
            (ProfileType::Business, Some(name)) => {
                if self.store.business_name_taken(user_id, name).await? {
                    return Err(ServiceError::Conflict(format!(
                        "business profile '{name}' already exists"
                    )));
                }
            }
            (ProfileType::Business, None) => {}
        }

        match self.store.insert_profile(&profile).await? {
            WriteOutcome::Applied => {
                tracing::info!(profile_id = %profile.id, "Profile created");
                Ok(profile)
            }
            WriteOutcome::Conflict => Err(ServiceError::Conflict(
                "a matching profile was created concurrently".to_string(),
            )),
        }
    }

    /// ## Summary
    /// Lists the caller's profiles, oldest first.
    ///
    /// ## Errors
    /// Returns `NotAuthenticated` or a database error.
    pub async fn list_my_profiles<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
    ) -> ServiceResult<Vec<SchedulingProfile>> {
        let user_id = require_user(auth)?;
        Ok(self.store.list_profiles_by_owner(user_id).await?)
    }

    /// ## Summary
    /// Returns one of the caller's profiles.
    ///
    /// ## Errors
    /// Returns `NotFound` or `AuthorizationError`.
    pub async fn get_profile<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        profile_id: uuid::Uuid,
    ) -> ServiceResult<SchedulingProfile> {
        self.owned_profile(auth, profile_id).await
    }

    /// ## Summary
    /// Deletes a profile with its schedules, availabilities and past
    /// appointments.
    ///
    /// ## Side Effects
    /// - Removes the profile and everything it owns
    ///
    /// ## Errors
    /// Returns `NotFound`, `AuthorizationError`, or `InvalidState` while the
    /// profile is host or guest of a scheduled appointment.
    #[tracing::instrument(skip(self, auth))]
    pub async fn delete_profile<A: AuthContext + ?Sized>(
        &self,
        auth: &A,
        profile_id: uuid::Uuid,
    ) -> ServiceResult<()> {
        self.owned_profile(auth, profile_id).await?;

        match self.store.delete_profile(profile_id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!("Profile deleted");
                Ok(())
            }
            DeleteOutcome::Missing => Err(ServiceError::not_found("profile", profile_id)),
            DeleteOutcome::Blocked => {
                tracing::warn!("Profile still has scheduled appointments");
                Err(ServiceError::InvalidState(
                    "profile has scheduled appointments".to_string(),
                ))
            }
        }
    }
}
