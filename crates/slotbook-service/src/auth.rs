//! Caller identity as seen by the scheduling use cases.
//!
//! Authentication happens elsewhere; the service only needs the caller's
//! external user id and a way to decide whether that user owns a profile.

use slotbook_core::scheduling::SchedulingProfile;

use crate::error::{ServiceError, ServiceResult};

/// Authorization collaborator consumed by every use case.
pub trait AuthContext: Send + Sync {
    /// The authenticated user's external id, or `None` for anonymous callers.
    fn current_user_id(&self) -> Option<&str>;

    /// Whether `user_id` owns `profile`.
    fn is_owned_by(&self, profile: &SchedulingProfile, user_id: &str) -> bool {
        profile.is_owned_by(user_id)
    }
}

/// The caller of a use case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Caller {
    /// An authenticated user, identified by their external user id.
    User(String),
    Anonymous,
}

impl Caller {
    #[must_use]
    pub fn user(external_user_id: impl Into<String>) -> Self {
        Self::User(external_user_id.into())
    }
}

impl AuthContext for Caller {
    fn current_user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id.as_str()),
            Self::Anonymous => None,
        }
    }
}

/// ## Summary
/// Returns the caller's user id.
///
/// ## Errors
/// Returns `NotAuthenticated` for anonymous callers.
pub fn require_user<A: AuthContext + ?Sized>(auth: &A) -> ServiceResult<&str> {
    auth.current_user_id().ok_or(ServiceError::NotAuthenticated)
}

/// ## Summary
/// Checks that the caller owns `profile`.
///
/// ## Errors
/// Returns `NotAuthenticated` for anonymous callers and `AuthorizationError`
/// when another user owns the profile.
pub fn require_owner<A: AuthContext + ?Sized>(
    auth: &A,
    profile: &SchedulingProfile,
) -> ServiceResult<()> {
    let user_id = require_user(auth)?;
    if auth.is_owned_by(profile, user_id) {
        Ok(())
    } else {
        tracing::warn!(profile_id = %profile.id, "Caller does not own profile");
        Err(ServiceError::AuthorizationError(format!(
            "profile {} belongs to another user",
            profile.id
        )))
    }
}
