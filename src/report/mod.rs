//! Plain-text rendering of quotes for chat delivery.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::domain::{Quote, ResultTable, Target};
use crate::fetcher::{RetryState, RetryStatus};

/// Minutes east of UTC used when none is configured (Asia/Kolkata).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

#[derive(Debug, Clone, Copy)]
pub struct ReportFormatter {
    offset: FixedOffset,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_UTC_OFFSET_MINUTES)
    }
}

impl ReportFormatter {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Out-of-range offsets fall back to UTC.
    pub fn from_minutes(minutes: i32) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self::new(offset)
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string()
    }

    /// One line per target, in target order.
    pub fn price_update(&self, targets: &[Target], table: &ResultTable) -> String {
        let mut out = format!("🕒 Price Update ({})\n", self.timestamp(Utc::now()));
        for target in targets {
            let price = table
                .get(&target.id)
                .map(Quote::display_price)
                .unwrap_or_else(|| "Price unavailable".to_string());
            let _ = write!(out, "\n{}: {}", target.heading(), price);
        }
        out
    }

    /// Sent as soon as `done` succeeds while `waiting` are still being retried.
    pub fn partial(&self, done: &RetryState, waiting: &[&RetryState]) -> String {
        let mut out = format!("⏳ Partial Update ({})\n\n", self.timestamp(Utc::now()));
        let _ = write!(
            out,
            "{}: {} (attempt {})",
            done.target.heading(),
            price_of(done),
            done.attempts_made
        );

        let names: Vec<String> = waiting.iter().map(|s| s.target.display_name()).collect();
        let _ = write!(out, "\n\nStill trying: {}", names.join(", "));
        out
    }

    pub fn final_report(&self, states: &[RetryState]) -> String {
        let mut out = format!("✅ Final Update ({})\n", self.timestamp(Utc::now()));
        for state in states {
            let line = match state.status {
                RetryStatus::Succeeded => price_of(state),
                RetryStatus::Exhausted => "unavailable after maximum retries".to_string(),
                RetryStatus::Aborted => "unavailable (browser session aborted)".to_string(),
                RetryStatus::Pending | RetryStatus::Attempting => "still pending".to_string(),
            };
            let _ = write!(out, "\n{}: {}", state.target.heading(), line);
        }
        out
    }

    /// Grid of prices, one block per name with a line per variant.
    pub fn matrix(
        &self,
        title: &str,
        names: &[String],
        variants: &[String],
        table: &ResultTable,
    ) -> String {
        let mut out = format!("📱 {} ({})\n", title, self.timestamp(Utc::now()));
        for name in names {
            let _ = write!(out, "\n{}", name);
            for variant in variants {
                let price = table
                    .get_variant(name, variant)
                    .map(Quote::display_price)
                    .unwrap_or_else(|| "Price unavailable".to_string());
                let _ = write!(out, "\n  {}: {}", variant, price);
            }
            out.push('\n');
        }
        let _ = write!(
            out,
            "\n{} of {} prices available",
            table.available_count(),
            names.len() * variants.len()
        );
        out
    }
}

fn price_of(state: &RetryState) -> String {
    state
        .best
        .as_ref()
        .map(Quote::display_price)
        .unwrap_or_else(|| "Price unavailable".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;
    use crate::domain::{matrix_targets, Amount, UnavailableReason};
    use crate::scraper::SourceProfile;

    fn profile() -> Arc<SourceProfile> {
        Arc::new(SourceProfile::with_selectors("p", vec!["p".into()]))
    }

    fn amount(value: f64, currency: &str) -> Amount {
        Amount {
            value,
            currency: currency.into(),
        }
    }

    #[test]
    fn test_timestamp_uses_offset() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        assert_eq!(
            ReportFormatter::default().timestamp(at),
            "2024-03-02 01:30:00 +05:30"
        );
        assert_eq!(ReportFormatter::utc().timestamp(at), "2024-03-01 20:00:00 +00:00");
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let formatter = ReportFormatter::from_minutes(100_000);
        assert_eq!(formatter.timestamp(at), "2024-03-01 20:00:00 +00:00");

        for minutes in [i32::MAX, i32::MIN] {
            let formatter = ReportFormatter::from_minutes(minutes);
            assert_eq!(formatter.timestamp(at), "2024-03-01 20:00:00 +00:00");
        }
    }

    #[test]
    fn test_price_update_lines() {
        let abc = Target::single("abc", "ABC Bullion", "https://a", profile()).with_icon("🏆");
        let aarav = Target::single("aarav", "Aarav Bullion", "https://b", profile()).with_icon("💫");

        let mut table = ResultTable::new();
        table
            .insert(Quote::available(&abc, "$3,210.00".into(), amount(3210.0, "$"), 1))
            .unwrap();
        table
            .insert(Quote::unavailable(&aarav, UnavailableReason::NavigationTimeout, None, 1))
            .unwrap();

        let text = ReportFormatter::utc().price_update(&[abc, aarav], &table);
        assert!(text.starts_with("🕒 Price Update ("));
        assert!(text.contains("\n🏆 ABC Bullion: $3,210.00"));
        assert!(text.ends_with("\n💫 Aarav Bullion: Price unavailable"));
    }

    #[test]
    fn test_matrix_grid() {
        let names: Vec<String> = vec!["iphone-12".into(), "iphone-13".into()];
        let variants: Vec<String> = vec!["64gb".into(), "128gb".into()];
        let targets = matrix_targets(&names, &variants, "https://x/{name}/{variant}", profile());

        let mut table = ResultTable::new();
        for (i, t) in targets.iter().enumerate() {
            let quote = if i == 3 {
                Quote::unavailable(t, UnavailableReason::NotFound, None, 1)
            } else {
                Quote::available(t, "x".into(), amount(100.0 * (i + 1) as f64, "₹"), 1)
            };
            table.insert(quote).unwrap();
        }

        let text = ReportFormatter::utc().matrix("iPhone trade-in", &names, &variants, &table);
        assert!(text.contains("\niphone-12\n  64gb: ₹100.00\n  128gb: ₹200.00\n"));
        assert!(text.contains("\niphone-13\n  64gb: ₹300.00\n  128gb: Price unavailable\n"));
        assert!(text.ends_with("3 of 4 prices available"));
    }
}
