//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors.
///
/// Variants fall into four groups that callers branch on: durable store
/// failures, ephemeral store failures, conflicts and not-found. Conflicts and
/// not-found are normally folded into outcome enums before they reach a
/// caller; they exist here so adapters have something precise to report.
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Stats not found for user: {0}")]
    UserStatsNotFound(Snowflake),

    #[error("No open voice session for user {user_id} in channel {channel_id}")]
    VoiceSessionNotFound {
        user_id: Snowflake,
        channel_id: Snowflake,
    },

    #[error("Role assignment not found")]
    AssignmentNotFound,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid activity type: {0}")]
    InvalidActivityType(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Role already assigned")]
    AssignmentExists,

    #[error("Voice session already open")]
    SessionAlreadyOpen,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Cache operation timed out")]
    CacheTimeout,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserStatsNotFound(_) => "UNKNOWN_USER_STATS",
            Self::VoiceSessionNotFound { .. } => "UNKNOWN_VOICE_SESSION",
            Self::AssignmentNotFound => "UNKNOWN_ASSIGNMENT",

            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidActivityType(_) => "INVALID_ACTIVITY_TYPE",

            Self::AssignmentExists => "ASSIGNMENT_EXISTS",
            Self::SessionAlreadyOpen => "SESSION_ALREADY_OPEN",

            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheUnavailable(_) => "CACHE_UNAVAILABLE",
            Self::CacheTimeout => "CACHE_TIMEOUT",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserStatsNotFound(_) | Self::VoiceSessionNotFound { .. } | Self::AssignmentNotFound
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::InvalidActivityType(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AssignmentExists | Self::SessionAlreadyOpen)
    }

    /// The counter store of record failed; the triggering work must not be
    /// reported as done
    pub fn is_durable_failure(&self) -> bool {
        matches!(self, Self::DatabaseError(_))
    }

    /// An accelerator failed; callers degrade instead of failing
    pub fn is_ephemeral_failure(&self) -> bool {
        matches!(self, Self::CacheUnavailable(_) | Self::CacheTimeout)
    }
}
