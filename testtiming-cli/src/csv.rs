//! CSV rendering of timing records.
//!
//! `shortHash,commitTime,[builder,]STATUS,passSeconds,failSeconds`, with
//! exactly one of the two duration columns filled.

use std::time::Duration;

use chrono::{DateTime, Utc};

use testtiming_board::TimingRecord;
use testtiming_core::short_hash;

/// One output line, without the trailing newline. The builder column is
/// present only when the dashboard has more than one builder.
pub fn format_line(record: &TimingRecord, with_builder: bool) -> String {
    let mut line = format!(
        "{},{},",
        short_hash(&record.commit),
        format_commit_time(record.commit_time)
    );
    if with_builder {
        line.push_str(&record.builder);
        line.push(',');
    }
    line.push_str(&format!(
        "{},{},{}",
        record.status,
        seconds(record.pass_duration),
        seconds(record.fail_duration)
    ));
    line
}

pub fn format_commit_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S +0000 UTC").to_string()
}

fn seconds(duration: Option<Duration>) -> String {
    duration
        .map(|d| format_seconds(d.as_secs_f64()))
        .unwrap_or_default()
}

/// Shortest round-trip digits, switching to exponent form (`1e-05`, `1.5e+21`)
/// when the decimal exponent is below -4 or at least 21.
pub fn format_seconds(secs: f64) -> String {
    let sci = format!("{secs:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return secs.to_string();
    };
    let exp: i32 = match exp.parse() {
        Ok(exp) => exp,
        Err(_) => return secs.to_string(),
    };
    if secs == 0.0 || (-4..21).contains(&exp) {
        return secs.to_string();
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.abs())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use testtiming_core::TestStatus;

    fn record(builder: &str, status: TestStatus, pass: Option<f64>, fail: Option<f64>) -> TimingRecord {
        TimingRecord {
            builder: builder.to_string(),
            commit: "0123456789abcdef0123".to_string(),
            commit_time: Utc.with_ymd_and_hms(2024, 10, 15, 20, 37, 52).unwrap(),
            status,
            pass_duration: pass.map(Duration::from_secs_f64),
            fail_duration: fail.map(Duration::from_secs_f64),
        }
    }

    #[test]
    fn single_builder_has_four_value_groups() {
        assert_eq!(
            format_line(&record("gotip-linux-amd64", TestStatus::Pass, Some(1.5), None), false),
            "01234567,2024-10-15 20:37:52 +0000 UTC,PASS,1.5,"
        );
        assert_eq!(
            format_line(&record("gotip-linux-amd64", TestStatus::Fail, None, Some(2.0)), false),
            "01234567,2024-10-15 20:37:52 +0000 UTC,FAIL,,2"
        );
    }

    #[test]
    fn several_builders_add_builder_column() {
        assert_eq!(
            format_line(&record("gotip-linux-arm64", TestStatus::Crash, None, Some(0.25)), true),
            "01234567,2024-10-15 20:37:52 +0000 UTC,gotip-linux-arm64,CRASH,,0.25"
        );
    }

    #[test]
    fn seconds_use_exponent_form_only_at_the_extremes() {
        let cases = [
            (0.0, "0"),
            (2.0, "2"),
            (1.5, "1.5"),
            (0.0001, "0.0001"),
            (0.00001, "1e-05"),
            (0.000015, "1.5e-05"),
            (1e-10, "1e-10"),
            (123456.789, "123456.789"),
            (1e20, "100000000000000000000"),
            (1e21, "1e+21"),
        ];
        for (secs, want) in cases {
            assert_eq!(format_seconds(secs), want, "{secs}");
        }
    }

    #[test]
    fn sub_tenth_millisecond_duration_in_line() {
        let line = format_line(&record("b", TestStatus::Pass, Some(0.00001), None), false);
        assert!(line.ends_with(",PASS,1e-05,"), "got: {line}");
    }

    #[test]
    fn commit_time_is_utc() {
        let t = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_commit_time(t), "2023-01-02 03:04:05 +0000 UTC");
    }
}
