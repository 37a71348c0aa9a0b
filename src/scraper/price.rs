//! Price text normalization.
//!
//! Turns strings such as `"AU$1,234.56 approx"` or `"Rs. 72,500"` into an
//! [`Amount`]. Text with no currency marker is rejected unless the source
//! declares an implied currency.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::Amount;

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\bAU\$|\bA\$|\bUS\$|\b[A-Z]{1,2}\$|\$|\u{20B9}|\u{20AC}|\u{00A3}|\u{00A5}|\bRs\.?|\bINR\b|\bUSD\b|\bAUD\b|\bEUR\b|\bGBP\b)",
    )
    .expect("currency regex is valid")
});

// Lakh grouping (1,23,456) is accepted alongside western grouping.
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}(?:,\d{2,3})+(?:\.\d+)?|\d+(?:\.\d+)?").expect("amount regex is valid")
});

#[derive(Debug, Clone, Default)]
pub struct PriceParser {
    implied_currency: Option<String>,
}

impl PriceParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept bare numbers and label them with `currency`.
    pub fn with_implied_currency(currency: impl Into<String>) -> Self {
        Self {
            implied_currency: Some(canonical_currency(&currency.into())),
        }
    }

    pub fn implied_currency(&self) -> Option<&str> {
        self.implied_currency.as_deref()
    }

    pub fn parse(&self, text: &str) -> Option<Amount> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let (currency, digits) = match CURRENCY_RE.find(text) {
            Some(m) => {
                // Prefer the number right after the marker, so label prefixes
                // like "1 oz:" are skipped.
                let after = AMOUNT_RE.find(&text[m.end()..]);
                let digits = after.or_else(|| AMOUNT_RE.find(&text[..m.start()]))?;
                (canonical_currency(m.as_str()), digits.as_str())
            }
            None => {
                let currency = self.implied_currency.clone()?;
                (currency, AMOUNT_RE.find(text)?.as_str())
            }
        };

        let value: f64 = digits.replace(',', "").parse().ok()?;
        if !value.is_finite() || value <= 0.0 {
            return None;
        }

        Some(Amount { value, currency })
    }
}

fn canonical_currency(marker: &str) -> String {
    let upper = marker.trim().trim_end_matches('.').to_uppercase();
    match upper.as_str() {
        "AU$" | "A$" | "AUD" => "AU$",
        "US$" | "USD" | "$" => "$",
        "\u{20B9}" | "RS" | "INR" => "\u{20B9}",
        "\u{20AC}" | "EUR" => "\u{20AC}",
        "\u{00A3}" | "GBP" => "\u{00A3}",
        "\u{00A5}" => "\u{00A5}",
        _ => return marker.trim().to_string(),
    }
    .to_string()
}
