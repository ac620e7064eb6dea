//! Free-text expense parser
//!
//! Turns messages like `"Coffee $5.50"` or `"yesterday 20 Groceries run"` into
//! a transaction draft. This is a first-match heuristic, not a grammar: every
//! pattern list below is tried in order and the first hit wins.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::{AMOUNT_SCALE, UNKNOWN_VENDOR};

/// Result of parsing one message
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub vendor: String,
    pub note: String,
    pub is_valid: bool,
}

impl ParsedTransaction {
    fn invalid(today: NaiveDate) -> Self {
        Self {
            amount: Decimal::ZERO,
            date: today,
            vendor: String::new(),
            note: String::new(),
            is_valid: false,
        }
    }

    /// Note as an optional value, empty notes are absent
    pub fn note_opt(&self) -> Option<&str> {
        (!self.note.is_empty()).then_some(self.note.as_str())
    }
}

struct Patterns {
    /// Symbol-prefixed amount first, then code-suffixed amount
    amounts: [Regex; 2],
    /// Full numeric date first, then month/day only
    dates: [Regex; 2],
    keywords: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        amounts: [
            Regex::new(r"[$€£₹]?\s*(\d+(?:\.\d+)?)").expect("amount pattern"),
            Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:usd|eur|gbp|inr)\b").expect("currency pattern"),
        ],
        dates: [
            Regex::new(r"(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})").expect("full date pattern"),
            Regex::new(r"(\d{1,2})[/-](\d{1,2})").expect("short date pattern"),
        ],
        keywords: Regex::new(r"(?i)today|yesterday").expect("keyword pattern"),
    })
}

/// Parse a message relative to the current UTC date
pub fn parse_message(text: &str) -> ParsedTransaction {
    parse_message_on(text, Utc::now().date_naive())
}

/// Parse a message relative to `today`
pub fn parse_message_on(text: &str, today: NaiveDate) -> ParsedTransaction {
    let text = text.trim();

    let Some(amount) = extract_amount(text) else {
        return ParsedTransaction::invalid(today);
    };

    let date = extract_date(text, today);
    let (vendor, note) = extract_vendor_note(text);

    ParsedTransaction {
        amount,
        date,
        vendor,
        note,
        is_valid: true,
    }
}

/// Largest amount a `NUMERIC(12,2)` column holds
fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, AMOUNT_SCALE)
}

/// Amounts are kept in cents, rounded half away from zero like Postgres does
fn extract_amount(text: &str) -> Option<Decimal> {
    patterns().amounts.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let amount = Decimal::from_str(caps.get(1)?.as_str())
            .ok()?
            .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        (amount > Decimal::ZERO && amount <= max_amount()).then_some(amount)
    })
}

fn extract_date(text: &str, today: NaiveDate) -> NaiveDate {
    let lower = text.to_lowercase();
    if lower.contains("today") {
        return today;
    }
    if lower.contains("yesterday") {
        return today - Duration::days(1);
    }

    for re in &patterns().dates {
        let Some(caps) = re.captures(text) else {
            continue;
        };

        let month: u32 = caps[1].parse().unwrap_or(0);
        let day: u32 = caps[2].parse().unwrap_or(0);
        let year = match caps.get(3) {
            Some(y) => {
                let year: i32 = y.as_str().parse().unwrap_or(today.year());
                if year < 100 {
                    2000 + year
                } else {
                    year
                }
            }
            None => today.year(),
        };

        // First match wins even when it is not a real calendar day
        return NaiveDate::from_ymd_opt(year, month, day).unwrap_or(today);
    }

    today
}

fn extract_vendor_note(text: &str) -> (String, String) {
    let p = patterns();

    // Dates go first so "12/25" is not torn apart by the amount patterns,
    // and code-suffixed amounts before bare ones so "USD" does not survive.
    let mut rest = text.to_string();
    for re in &p.dates {
        rest = re.replace_all(&rest, " ").into_owned();
    }
    for re in p.amounts.iter().rev() {
        rest = re.replace_all(&rest, " ").into_owned();
    }
    rest = p.keywords.replace_all(&rest, " ").into_owned();

    let mut words = rest.split_whitespace();
    match words.next() {
        None => (UNKNOWN_VENDOR.to_string(), String::new()),
        Some(vendor) => (vendor.to_string(), words.collect::<Vec<_>>().join(" ")),
    }
}
