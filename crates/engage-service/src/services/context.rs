//! Service context - dependency container for services
//!
//! Holds the storage ports, the id generator, engine settings and the
//! per-user voice locks.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use engage_common::EngagementConfig;
use engage_core::traits::{
    ActivityLogRepository, EphemeralStore, RoleAssignmentRepository, RoleRuleRepository,
    StatsRepository, StoreResult, VoiceSessionRepository,
};
use engage_core::{DomainError, Snowflake, SnowflakeGenerator};

use super::error::{ServiceError, ServiceResult};
use super::ingest::ReconcilePolicy;
use super::locks::UserLocks;

/// Tunables shared by all services
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound on any single ephemeral store call
    pub cache_timeout: Duration,
    pub leaderboard_cache_ttl: u64,
    pub stats_cache_ttl: u64,
    pub reconcile: ReconcilePolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngagementConfig::default())
    }
}

impl From<&EngagementConfig> for EngineSettings {
    fn from(config: &EngagementConfig) -> Self {
        Self {
            cache_timeout: Duration::from_millis(config.cache_timeout_ms.max(1)),
            leaderboard_cache_ttl: config.leaderboard_cache_ttl,
            stats_cache_ttl: config.stats_cache_ttl,
            reconcile: ReconcilePolicy {
                every_n: config.reconcile_every,
                on_voice_leave: config.reconcile_on_voice_leave,
            },
        }
    }
}

/// Service context containing all dependencies
///
/// Cheap to clone: every field is shared.
#[derive(Clone)]
pub struct ServiceContext {
    // Durable counter store
    stats_repo: Arc<dyn StatsRepository>,
    voice_repo: Arc<dyn VoiceSessionRepository>,
    rule_repo: Arc<dyn RoleRuleRepository>,
    assignment_repo: Arc<dyn RoleAssignmentRepository>,
    activity_log_repo: Arc<dyn ActivityLogRepository>,

    // Accelerators
    ephemeral: Arc<dyn EphemeralStore>,

    snowflake_generator: Arc<SnowflakeGenerator>,
    voice_locks: Arc<UserLocks>,
    settings: EngineSettings,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stats_repo: Arc<dyn StatsRepository>,
        voice_repo: Arc<dyn VoiceSessionRepository>,
        rule_repo: Arc<dyn RoleRuleRepository>,
        assignment_repo: Arc<dyn RoleAssignmentRepository>,
        activity_log_repo: Arc<dyn ActivityLogRepository>,
        ephemeral: Arc<dyn EphemeralStore>,
        snowflake_generator: Arc<SnowflakeGenerator>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            stats_repo,
            voice_repo,
            rule_repo,
            assignment_repo,
            activity_log_repo,
            ephemeral,
            snowflake_generator,
            voice_locks: Arc::new(UserLocks::new()),
            settings,
        }
    }

    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Repositories ===

    pub fn stats_repo(&self) -> &dyn StatsRepository {
        self.stats_repo.as_ref()
    }

    pub fn voice_repo(&self) -> &dyn VoiceSessionRepository {
        self.voice_repo.as_ref()
    }

    pub fn rule_repo(&self) -> &dyn RoleRuleRepository {
        self.rule_repo.as_ref()
    }

    pub fn assignment_repo(&self) -> &dyn RoleAssignmentRepository {
        self.assignment_repo.as_ref()
    }

    pub fn activity_log_repo(&self) -> &dyn ActivityLogRepository {
        self.activity_log_repo.as_ref()
    }

    // === Accelerators ===

    /// Raw ephemeral store. Prefer [`Self::ephemeral`], which bounds the call.
    pub fn ephemeral_store(&self) -> &dyn EphemeralStore {
        self.ephemeral.as_ref()
    }

    /// Run one ephemeral store operation under the cache timeout.
    /// An elapsed timeout is reported as `DomainError::CacheTimeout`.
    pub async fn ephemeral<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.settings.cache_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::CacheTimeout),
        }
    }

    // === Misc ===

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn voice_locks(&self) -> &UserLocks {
        self.voice_locks.as_ref()
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("ephemeral", &"...")
            .field("voice_locks", &self.voice_locks.len())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    stats_repo: Option<Arc<dyn StatsRepository>>,
    voice_repo: Option<Arc<dyn VoiceSessionRepository>>,
    rule_repo: Option<Arc<dyn RoleRuleRepository>>,
    assignment_repo: Option<Arc<dyn RoleAssignmentRepository>>,
    activity_log_repo: Option<Arc<dyn ActivityLogRepository>>,
    ephemeral: Option<Arc<dyn EphemeralStore>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    settings: Option<EngineSettings>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats_repo(mut self, repo: Arc<dyn StatsRepository>) -> Self {
        self.stats_repo = Some(repo);
        self
    }

    pub fn voice_repo(mut self, repo: Arc<dyn VoiceSessionRepository>) -> Self {
        self.voice_repo = Some(repo);
        self
    }

    pub fn rule_repo(mut self, repo: Arc<dyn RoleRuleRepository>) -> Self {
        self.rule_repo = Some(repo);
        self
    }

    pub fn assignment_repo(mut self, repo: Arc<dyn RoleAssignmentRepository>) -> Self {
        self.assignment_repo = Some(repo);
        self
    }

    pub fn activity_log_repo(mut self, repo: Arc<dyn ActivityLogRepository>) -> Self {
        self.activity_log_repo = Some(repo);
        self
    }

    pub fn ephemeral(mut self, store: Arc<dyn EphemeralStore>) -> Self {
        self.ephemeral = Some(store);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the ServiceContext
    ///
    /// The id generator and settings fall back to their defaults.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any storage port is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let missing = |name: &str| ServiceError::validation(format!("{name} is required"));

        Ok(ServiceContext::new(
            self.stats_repo.ok_or_else(|| missing("stats_repo"))?,
            self.voice_repo.ok_or_else(|| missing("voice_repo"))?,
            self.rule_repo.ok_or_else(|| missing("rule_repo"))?,
            self.assignment_repo.ok_or_else(|| missing("assignment_repo"))?,
            self.activity_log_repo.ok_or_else(|| missing("activity_log_repo"))?,
            self.ephemeral.ok_or_else(|| missing("ephemeral"))?,
            self.snowflake_generator.unwrap_or_default(),
            self.settings.unwrap_or_default(),
        ))
    }
}
