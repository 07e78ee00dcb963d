//
// CloudFront access log filename grammar. Keys that do not conform are
// skipped entirely: the tool never deletes objects of unknown provenance,
// even when they sit under the watched prefix.
//

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

// <distribution-id>.<YYYY-MM-DD-HH>.<unique-suffix>.gz, anchored to a path
// segment boundary and the end of the key.
fn access_log_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|/)[A-Z0-9]+\.([0-9]{4})-([0-9]{2})-([0-9]{2})-[0-9]{2}\.[0-9a-f]+\.gz$")
            .unwrap()
    })
}

/// Test a key against the access log grammar. Returns the date embedded in
/// the filename, or `None` if the key does not conform. A date segment that
/// is not a real calendar date is treated as a non-match.
pub fn match_access_log(key: &str) -> Option<NaiveDate> {
    let captures = access_log_pattern().captures(key)?;

    // Capture groups are fixed-width digit runs, so these parses cannot fail.
    let year: i32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let day: u32 = captures[3].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_access_log_key_under_prefix() {
        let date = match_access_log("logs/E1234.2020-01-01-00.abcde.gz");
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn matches_real_distribution_key_at_root() {
        let date = match_access_log("EMLARXS9EXAMPLE.2019-11-14-20.ce309b1b.gz");
        assert_eq!(date, NaiveDate::from_ymd_opt(2019, 11, 14));
    }

    #[test]
    fn ignores_keys_outside_the_grammar() {
        assert_eq!(match_access_log("other/random.txt"), None);
        assert_eq!(match_access_log("logs/E1234.2020-01-01-00.abcde.gz.bak"), None);
        assert_eq!(match_access_log("logs/e1234.2020-01-01-00.abcde.gz"), None);
        assert_eq!(match_access_log("logs/E1234.2020-01-01.abcde.gz"), None);
        assert_eq!(match_access_log(""), None);
    }

    #[test]
    fn grammar_must_cover_the_final_path_segment() {
        // Date-shaped token buried in a directory component is not a log.
        assert_eq!(
            match_access_log("logs/E1234.2020-01-01-00.abcde.gz/trailer"),
            None
        );
        // Distribution id must immediately follow a segment boundary.
        assert_eq!(
            match_access_log("logs/xE1234.2020-01-01-00.abcde.gz"),
            None
        );
    }

    #[test]
    fn impossible_calendar_dates_are_non_matches() {
        assert_eq!(match_access_log("logs/E1234.2020-02-30-00.abcde.gz"), None);
        assert_eq!(match_access_log("logs/E1234.2020-13-01-00.abcde.gz"), None);
        assert_eq!(match_access_log("logs/E1234.2020-00-10-00.abcde.gz"), None);
    }

    #[test]
    fn leap_day_is_a_valid_date() {
        let date = match_access_log("logs/E1234.2020-02-29-23.deadbeef.gz");
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 2, 29));
    }
}
