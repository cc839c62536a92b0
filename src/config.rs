use crate::core::appeals::AppealConfig;
use crate::core::history::DEFAULT_HISTORY_LIMIT;
use anyhow::{ensure, Context, Result};
use std::env;
use std::path::PathBuf;

/// Upper bound for `APPEAL_THROTTLE_DAYS` (ten years).
const MAX_THROTTLE_DAYS: i64 = 3650;

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    /// Channel that receives new cases. Submissions fail with a server error
    /// while this is unset; the appeal itself is still stored.
    pub appeal_channel_id: Option<u64>,
    pub data_dir: PathBuf,
    pub appeals_db: PathBuf,
    pub reports_db: PathBuf,
    /// Written by the login service, read here.
    pub sessions_db: PathBuf,
    pub port: u16,
    pub throttle_days: i64,
    pub case_id_max_attempts: u32,
    pub history_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let discord_token = env::var("DISCORD_TOKEN")
            .context("DISCORD_TOKEN environment variable is required")?;

        let appeal_channel_id = match env::var("APPEAL_CHANNEL_ID") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u64>()
                    .context("APPEAL_CHANNEL_ID must be a valid channel id")?,
            ),
            _ => None,
        };

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let db_path = |var: &str, file: &str| {
            env::var(var)
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join(file))
        };
        let appeals_db = db_path("APPEALS_DB", "appeals.db");
        let reports_db = db_path("REPORTS_DB", "reports.db");
        let sessions_db = db_path("SESSIONS_DB", "sessions.db");

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        let throttle_days = parse_throttle_days(env::var("APPEAL_THROTTLE_DAYS").ok())?;

        let case_id_max_attempts = env::var("CASE_ID_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "64".to_string())
            .parse::<u32>()
            .context("CASE_ID_MAX_ATTEMPTS must be a valid number")?;

        let history_limit = env::var("HISTORY_LIMIT")
            .map(|raw| raw.parse::<usize>())
            .unwrap_or(Ok(DEFAULT_HISTORY_LIMIT))
            .context("HISTORY_LIMIT must be a valid number")?;

        Ok(Config {
            discord_token,
            appeal_channel_id,
            data_dir,
            appeals_db,
            reports_db,
            sessions_db,
            port,
            throttle_days,
            case_id_max_attempts,
            history_limit,
        })
    }

    pub fn appeal_config(&self) -> AppealConfig {
        AppealConfig {
            throttle_window: chrono::Duration::days(self.throttle_days),
            case_id_max_attempts: self.case_id_max_attempts,
            ..AppealConfig::default()
        }
    }
}

/// Throttle window in days. Unset means 7; zero turns throttling off.
fn parse_throttle_days(raw: Option<String>) -> Result<i64> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(7);
    };
    let days = raw
        .trim()
        .parse::<i64>()
        .context("APPEAL_THROTTLE_DAYS must be a whole number of days")?;
    ensure!(
        (0..=MAX_THROTTLE_DAYS).contains(&days),
        "APPEAL_THROTTLE_DAYS must be between 0 and {}, got {}",
        MAX_THROTTLE_DAYS,
        days
    );
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_throttle_days_default() {
        assert_eq!(parse_throttle_days(None).unwrap(), 7);
        assert_eq!(parse_throttle_days(Some("  ".to_string())).unwrap(), 7);
    }

    #[test]
    fn test_parse_throttle_days_valid() {
        assert_eq!(parse_throttle_days(Some("0".to_string())).unwrap(), 0);
        assert_eq!(parse_throttle_days(Some(" 14 ".to_string())).unwrap(), 14);
        assert_eq!(
            parse_throttle_days(Some(MAX_THROTTLE_DAYS.to_string())).unwrap(),
            MAX_THROTTLE_DAYS
        );
    }

    #[test]
    fn test_parse_throttle_days_out_of_range() {
        assert!(parse_throttle_days(Some("-1".to_string())).is_err());
        assert!(parse_throttle_days(Some("3651".to_string())).is_err());
        // Would overflow chrono::Duration::days if it got through.
        assert!(parse_throttle_days(Some(i64::MAX.to_string())).is_err());
        assert!(parse_throttle_days(Some("seven".to_string())).is_err());
    }
}
