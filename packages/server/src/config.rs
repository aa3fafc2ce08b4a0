use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::domains::memberships::MembershipPolicy;
use crate::domains::reminders::ReminderSettings;

/// The unread-messages check never runs sooner than this after a post.
pub const MIN_UNREAD_CHECK_DELAY_SECS: u64 = 10;

/// Longest accepted membership lockout (one week)
pub const MAX_LOCKOUT_MINUTES: i64 = 7 * 24 * 60;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub allowed_origins: Vec<String>,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_from_email: String,
    pub sendgrid_from_name: String,
    /// How long before `date_time` membership changes are frozen
    pub membership_lockout: chrono::Duration,
    pub unread_check_delay_secs: u64,
    pub unread_check_timeout_secs: u64,
    pub activity_log_retry_backoff_secs: u64,
    pub reminders_enabled: bool,
    pub reminder_interval_secs: u64,
    pub reminder_slack_minutes: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let config = Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "groops".to_string()),
            allowed_origins: parse_origins(&env::var("ALLOWED_ORIGINS").unwrap_or_default()),
            sendgrid_api_key: env::var("SENDGRID_API_KEY").ok().filter(|k| !k.is_empty()),
            sendgrid_from_email: env::var("SENDGRID_NOTIFICATIONS_FROM_EMAIL")
                .unwrap_or_else(|_| "notifications@groops.fun".to_string()),
            sendgrid_from_name: env::var("SENDGRID_FROM_NAME")
                .unwrap_or_else(|_| "Groops".to_string()),
            membership_lockout: env::var("MEMBERSHIP_LOCKOUT_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse::<i64>()
                .context("MEMBERSHIP_LOCKOUT_MINUTES must be a whole number of minutes")
                .and_then(lockout_from_minutes)
                .context("Invalid MEMBERSHIP_LOCKOUT_MINUTES")?,
            unread_check_delay_secs: env::var("UNREAD_CHECK_DELAY_SECS")
                .unwrap_or_else(|_| MIN_UNREAD_CHECK_DELAY_SECS.to_string())
                .parse::<u64>()
                .context("UNREAD_CHECK_DELAY_SECS must be a number")?
                .max(MIN_UNREAD_CHECK_DELAY_SECS),
            unread_check_timeout_secs: env::var("UNREAD_CHECK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("UNREAD_CHECK_TIMEOUT_SECS must be a number")?,
            activity_log_retry_backoff_secs: env::var("ACTIVITY_LOG_RETRY_BACKOFF_SECS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("ACTIVITY_LOG_RETRY_BACKOFF_SECS must be a number")?,
            reminders_enabled: env::var("REMINDERS_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            reminder_interval_secs: env::var("REMINDER_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("REMINDER_INTERVAL_SECS must be a number")?,
            reminder_slack_minutes: env::var("REMINDER_SLACK_MINUTES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("REMINDER_SLACK_MINUTES must be a whole number of minutes")?,
        };

        config.reminder_settings()?;
        Ok(config)
    }

    /// Membership rules derived from configuration
    pub fn membership_policy(&self) -> MembershipPolicy {
        MembershipPolicy {
            lockout: self.membership_lockout,
            activity_log_attempts: 3,
            activity_log_backoff: Duration::from_secs(self.activity_log_retry_backoff_secs),
        }
    }

    /// Reminder polling; the window must be wider than the polling interval
    pub fn reminder_settings(&self) -> Result<ReminderSettings> {
        let interval = Duration::from_secs(self.reminder_interval_secs.max(1));
        let slack = chrono::Duration::try_minutes(self.reminder_slack_minutes)
            .filter(|slack| *slack > chrono::Duration::zero())
            .context("REMINDER_SLACK_MINUTES must be a positive number of minutes")?;

        if slack.to_std().map_or(true, |slack| slack <= interval) {
            anyhow::bail!(
                "REMINDER_SLACK_MINUTES ({}) must be longer than REMINDER_INTERVAL_SECS ({})",
                self.reminder_slack_minutes,
                self.reminder_interval_secs
            );
        }

        Ok(ReminderSettings { interval, slack })
    }

    pub fn unread_check_delay(&self) -> Duration {
        Duration::from_secs(self.unread_check_delay_secs)
    }

    pub fn unread_check_timeout(&self) -> Duration {
        Duration::from_secs(self.unread_check_timeout_secs)
    }
}

fn lockout_from_minutes(minutes: i64) -> Result<chrono::Duration> {
    if !(0..=MAX_LOCKOUT_MINUTES).contains(&minutes) {
        anyhow::bail!(
            "lockout must be between 0 and {} minutes, got {}",
            MAX_LOCKOUT_MINUTES,
            minutes
        );
    }
    chrono::Duration::try_minutes(minutes).context("lockout out of range")
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_skips_blanks() {
        let origins = parse_origins("https://www.groops.fun, ,http://localhost:5173,");
        assert_eq!(
            origins,
            vec![
                "https://www.groops.fun".to_string(),
                "http://localhost:5173".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_origins_empty() {
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_lockout_from_minutes() {
        assert_eq!(
            lockout_from_minutes(60).unwrap(),
            chrono::Duration::minutes(60)
        );
        assert_eq!(lockout_from_minutes(0).unwrap(), chrono::Duration::zero());
        assert!(lockout_from_minutes(-5).is_err());
        assert!(lockout_from_minutes(MAX_LOCKOUT_MINUTES + 1).is_err());
        assert!(lockout_from_minutes(i64::MAX).is_err());
    }

    fn config_with_reminders(interval_secs: u64, slack_minutes: i64) -> Config {
        Config {
            database_url: String::new(),
            port: 8080,
            jwt_secret: "secret".to_string(),
            jwt_issuer: "groops".to_string(),
            allowed_origins: Vec::new(),
            sendgrid_api_key: None,
            sendgrid_from_email: String::new(),
            sendgrid_from_name: String::new(),
            membership_lockout: chrono::Duration::minutes(60),
            unread_check_delay_secs: MIN_UNREAD_CHECK_DELAY_SECS,
            unread_check_timeout_secs: 5,
            activity_log_retry_backoff_secs: 1,
            reminders_enabled: true,
            reminder_interval_secs: interval_secs,
            reminder_slack_minutes: slack_minutes,
        }
    }

    #[test]
    fn test_reminder_settings_require_slack_wider_than_interval() {
        let settings = config_with_reminders(300, 10).reminder_settings().unwrap();
        assert_eq!(settings.interval, Duration::from_secs(300));
        assert_eq!(settings.slack, chrono::Duration::minutes(10));

        assert!(config_with_reminders(600, 10).reminder_settings().is_err());
        assert!(config_with_reminders(300, 0).reminder_settings().is_err());
        assert!(config_with_reminders(300, i64::MAX).reminder_settings().is_err());
    }
}
