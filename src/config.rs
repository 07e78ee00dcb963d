//
// Validated run configuration, built once at startup from the parsed CLI
// arguments. Cutoff resolution happens here, before any S3 call is made.
//

use std::sync::OnceLock;

use chrono::{Days, NaiveDate};
use regex::Regex;

use crate::error::{ExpireError, Result};

// Year bounds for --expire-before: CloudFront did not exist before 2006,
// and anything past 2048 is a typo.
const EXPIRE_YEAR_MIN: i32 = 2006;
const EXPIRE_YEAR_MAX: i32 = 2048;

fn bucket_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-.]{1,61}[a-z0-9]$").unwrap())
}

fn log_prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9-./]+$").unwrap())
}

/// Everything a run needs, fully validated.
#[derive(Debug, Clone)]
pub struct Config {
    /// S3 bucket holding the access log archives.
    pub bucket: String,
    /// Normalised key prefix (single trailing slash), if any.
    pub prefix: Option<String>,
    /// Archives dated strictly before this date are expired.
    pub expire_before: NaiveDate,
    /// Print a per-archive DELETE/KEEP line.
    pub progress: bool,
    /// Actually delete; without this the run is a simulation.
    pub commit: bool,
}

impl Config {
    /// Validate raw CLI values and resolve the cutoff date. `today` is
    /// passed in so `--expire-days` resolution is deterministic in tests.
    pub fn resolve(
        bucket: String,
        prefix: Option<String>,
        expire_before: Option<String>,
        expire_days: Option<u64>,
        progress: bool,
        commit: bool,
        today: NaiveDate,
    ) -> Result<Self> {
        if !bucket_name_pattern().is_match(&bucket) {
            return Err(ExpireError::configuration(format!(
                "Invalid S3 bucket name [{bucket}]"
            )));
        }

        let prefix = prefix.map(|raw| normalise_prefix(&raw)).transpose()?;
        let expire_before = resolve_cutoff(expire_before, expire_days, today)?;

        Ok(Self {
            bucket,
            prefix,
            expire_before,
            progress,
            commit,
        })
    }
}

/// Strip leading/trailing slashes and append exactly one trailing slash.
fn normalise_prefix(raw: &str) -> Result<String> {
    if !log_prefix_pattern().is_match(raw) {
        return Err(ExpireError::configuration(format!(
            "Invalid S3 bucket log prefix [{raw}]"
        )));
    }

    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        return Err(ExpireError::configuration(format!(
            "Invalid S3 bucket log prefix [{raw}]"
        )));
    }

    Ok(format!("{trimmed}/"))
}

/// Exactly one of the two expiry criteria must be given.
fn resolve_cutoff(
    expire_before: Option<String>,
    expire_days: Option<u64>,
    today: NaiveDate,
) -> Result<NaiveDate> {
    match (expire_before, expire_days) {
        (Some(_), Some(_)) => Err(ExpireError::configuration(
            "Please specify only one of expire before date / expire days",
        )),
        (Some(date), None) => parse_expire_before(&date),
        (None, Some(days)) => {
            if days == 0 {
                return Err(ExpireError::configuration(
                    "Invalid value for expire days [0]",
                ));
            }
            today
                .checked_sub_days(Days::new(days))
                .ok_or_else(|| {
                    ExpireError::configuration(format!("Invalid value for expire days [{days}]"))
                })
        }
        (None, None) => Err(ExpireError::configuration(
            "Must specify log archive expiry as one of --expire-before or --expire-days",
        )),
    }
}

fn parse_expire_before(date: &str) -> Result<NaiveDate> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        ExpireError::configuration(format!(
            "Invalid format for expire before date [{date}], expected YYYY-MM-DD"
        ))
    })?;

    let year = chrono::Datelike::year(&parsed);
    if !(EXPIRE_YEAR_MIN..=EXPIRE_YEAR_MAX).contains(&year) {
        return Err(ExpireError::configuration(format!(
            "Invalid year for expire before date [{year}]"
        )));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 7, 15).unwrap()
    }

    fn resolve(
        expire_before: Option<&str>,
        expire_days: Option<u64>,
    ) -> Result<Config> {
        Config::resolve(
            "cdn-logs".into(),
            Some("logs".into()),
            expire_before.map(str::to_string),
            expire_days,
            false,
            false,
            today(),
        )
    }

    #[test]
    fn expire_before_resolves_to_given_date() {
        let config = resolve(Some("2023-01-31"), None).unwrap();
        assert_eq!(
            config.expire_before,
            NaiveDate::from_ymd_opt(2023, 1, 31).unwrap()
        );
    }

    #[test]
    fn expire_days_counts_back_from_today() {
        let config = resolve(None, Some(30)).unwrap();
        assert_eq!(
            config.expire_before,
            NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()
        );
    }

    #[test]
    fn both_expiry_criteria_rejected() {
        assert!(matches!(
            resolve(Some("2023-01-31"), Some(30)),
            Err(ExpireError::Configuration(_))
        ));
    }

    #[test]
    fn missing_expiry_criteria_rejected() {
        assert!(matches!(
            resolve(None, None),
            Err(ExpireError::Configuration(_))
        ));
    }

    #[test]
    fn zero_expire_days_rejected() {
        assert!(resolve(None, Some(0)).is_err());
    }

    #[test]
    fn malformed_expire_before_rejected() {
        assert!(resolve(Some("2023-02-30"), None).is_err());
        assert!(resolve(Some("31-01-2023"), None).is_err());
        assert!(resolve(Some("2003-01-31"), None).is_err());
        assert!(resolve(Some("2099-01-31"), None).is_err());
    }

    #[test]
    fn bucket_name_validated() {
        let result = Config::resolve(
            "Not_A_Bucket".into(),
            None,
            Some("2023-01-31".into()),
            None,
            false,
            false,
            today(),
        );
        assert!(matches!(result, Err(ExpireError::Configuration(_))));
    }

    #[test]
    fn prefix_normalised_with_trailing_slash() {
        let config = Config::resolve(
            "cdn-logs".into(),
            Some("/cdn/access/".into()),
            Some("2023-01-31".into()),
            None,
            false,
            false,
            today(),
        )
        .unwrap();
        assert_eq!(config.prefix.as_deref(), Some("cdn/access/"));
    }

    #[test]
    fn prefix_with_invalid_characters_rejected() {
        let result = Config::resolve(
            "cdn-logs".into(),
            Some("logs!".into()),
            Some("2023-01-31".into()),
            None,
            false,
            false,
            today(),
        );
        assert!(result.is_err());
    }
}
