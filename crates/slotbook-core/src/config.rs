use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::scheduling::BookingPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Defaults and limits applied by the scheduling use cases.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    pub default_min_advance_booking_minutes: i32,
    pub default_max_advance_booking_days: i32,
    pub default_cancellation_deadline_minutes: i32,
    /// How far ahead the maintenance job extends active schedules.
    pub generation_horizon_days: u32,
    /// Longest date range a single generation request may cover.
    pub max_generation_range_days: u32,
}

impl SchedulingConfig {
    /// ## Summary
    /// Booking policy used when a request leaves policy fields unset.
    #[must_use]
    pub const fn default_policy(&self) -> BookingPolicy {
        BookingPolicy {
            min_advance_booking_minutes: self.default_min_advance_booking_minutes,
            max_advance_booking_days: self.default_max_advance_booking_days,
            cancellation_deadline_minutes: self.default_cancellation_deadline_minutes,
        }
    }

    /// ## Summary
    /// Checks that the defaults form a valid policy and that the maintenance
    /// horizon fits in a single generation request.
    ///
    /// ## Errors
    /// Returns `ValidationError` if the default policy is invalid, or if the
    /// horizon spans more days than `max_generation_range_days` admits.
    pub fn validate(&self) -> CoreResult<()> {
        self.default_policy().validate()?;
        // The pass covers today through today + horizon, both inclusive.
        if u64::from(self.generation_horizon_days) + 1 > u64::from(self.max_generation_range_days)
        {
            return Err(CoreError::ValidationError(format!(
                "generation horizon of {} days does not fit the maximum generation range of {} days",
                self.generation_horizon_days, self.max_generation_range_days
            )));
        }
        Ok(())
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_min_advance_booking_minutes: 60,
            default_max_advance_booking_days: 90,
            default_cancellation_deadline_minutes: 1440,
            generation_horizon_days: 28,
            max_generation_range_days: 366,
        }
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables and an optional `config.toml`.
    /// Environment variables take precedence over file values.
    ///
    /// ## Errors
    /// Returns an error if building, deserializing or validating the
    /// configuration fails.
    pub fn load() -> Result<Self> {
        let defaults = SchedulingConfig::default();

        let config = Config::builder()
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "debug")?
            .set_default(
                "scheduling.default_min_advance_booking_minutes",
                defaults.default_min_advance_booking_minutes,
            )?
            .set_default(
                "scheduling.default_max_advance_booking_days",
                defaults.default_max_advance_booking_days,
            )?
            .set_default(
                "scheduling.default_cancellation_deadline_minutes",
                defaults.default_cancellation_deadline_minutes,
            )?
            .set_default(
                "scheduling.generation_horizon_days",
                defaults.generation_horizon_days,
            )?
            .set_default(
                "scheduling.max_generation_range_days",
                defaults.max_generation_range_days,
            )?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?;

        Self::from_config(config)
    }

    /// ## Summary
    /// Deserializes settings from an already assembled configuration and
    /// rejects scheduling limits the maintenance pass could never satisfy.
    ///
    /// ## Errors
    /// Returns an error if deserialization or validation fails.
    pub fn from_config(config: Config) -> Result<Self> {
        let settings = config.try_deserialize::<Self>()?;
        settings.scheduling.validate()?;
        Ok(settings)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
