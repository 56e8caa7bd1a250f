//! Value objects - immutable types that represent domain concepts

mod activity_type;
mod snowflake;

pub use activity_type::{ActivityType, StatCounter};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
