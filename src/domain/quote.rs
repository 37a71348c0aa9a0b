use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Target, TargetId};

/// Why a quote carries no price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Page matched a not-found signature
    NotFound,
    /// Ready marker never appeared
    NavigationTimeout,
    /// Navigation could not be issued (bad URL, network error page)
    NavigationFailed,
    /// Page was ready but no candidate text parsed as a price
    ExtractionMiss,
    /// Browser session died before this target was reached
    SessionAborted,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "page not found",
            Self::NavigationTimeout => "page did not become ready",
            Self::NavigationFailed => "navigation failed",
            Self::ExtractionMiss => "no price on page",
            Self::SessionAborted => "browser session aborted",
        };
        f.write_str(s)
    }
}

/// A normalized amount with its canonical currency marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub value: f64,
    pub currency: String,
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency, group_thousands(self.value))
    }
}

/// Format with two decimals and comma thousands separators.
fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Price {
    Available(Amount),
    Unavailable(UnavailableReason),
}

impl Price {
    pub fn is_available(&self) -> bool {
        matches!(self, Price::Available(_))
    }

    pub fn amount(&self) -> Option<&Amount> {
        match self {
            Price::Available(a) => Some(a),
            Price::Unavailable(_) => None,
        }
    }
}

/// Outcome of one extraction attempt for one target. Never mutated after
/// creation; another attempt produces another quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub target: TargetId,
    pub label: String,
    pub variant: Option<String>,
    pub raw_text: Option<String>,
    pub price: Price,
    pub attempt: u32,
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    pub fn available(target: &Target, raw_text: String, amount: Amount, attempt: u32) -> Self {
        Self::new(target, Some(raw_text), Price::Available(amount), attempt)
    }

    pub fn unavailable(
        target: &Target,
        reason: UnavailableReason,
        raw_text: Option<String>,
        attempt: u32,
    ) -> Self {
        Self::new(target, raw_text, Price::Unavailable(reason), attempt)
    }

    fn new(target: &Target, raw_text: Option<String>, price: Price, attempt: u32) -> Self {
        Self {
            target: target.id.clone(),
            label: target.label.clone(),
            variant: target.variant.clone(),
            raw_text,
            price,
            attempt,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.price.is_available()
    }

    pub fn reason(&self) -> Option<UnavailableReason> {
        match self.price {
            Price::Unavailable(r) => Some(r),
            Price::Available(_) => None,
        }
    }

    /// Price for display, or `Price unavailable`.
    pub fn display_price(&self) -> String {
        match &self.price {
            Price::Available(a) => a.to_string(),
            Price::Unavailable(_) => "Price unavailable".to_string(),
        }
    }
}
