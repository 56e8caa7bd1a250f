//! # engage-db
//!
//! Durable counter store: PostgreSQL implementations of the repository traits
//! defined in `engage-core`, via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management and runtime migrations
//! - Database models with SQLx `FromRow` derives
//! - Model → entity mappers
//! - Repository implementations
//!
//! Every write is a single statement that is atomic on its own: counter
//! upserts add in place, session closes are conditional and grants lean on
//! the assignment uniqueness constraint.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use engage_db::{create_pool, DatabaseConfig, PgStatsRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     let stats = PgStatsRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{
    PgActivityLogRepository, PgRoleAssignmentRepository, PgRoleRuleRepository,
    PgStatsRepository, PgVoiceSessionRepository,
};
