//! Display formatting shared by popups and summary statistics.

use chrono::{DateTime, FixedOffset, Utc};

const LAKH: f64 = 100_000.0;
const CRORE: f64 = 10_000_000.0;

/// Whole-rupee amount with Indian digit grouping, e.g. `₹1,25,000`.
pub fn format_inr(amount: f64) -> String {
    if !amount.is_finite() {
        return "₹0".to_string();
    }

    let rounded = amount.round();
    let digits = group_indian(rounded.abs() as u64);
    if rounded < 0.0 {
        format!("-₹{digits}")
    } else {
        format!("₹{digits}")
    }
}

/// Summary form: `₹2.85Cr` from one crore, `₹1.25L` from one lakh, full form below.
pub fn format_inr_compact(amount: f64) -> String {
    if amount >= CRORE {
        format!("₹{:.2}Cr", amount / CRORE)
    } else if amount >= LAKH {
        format!("₹{:.2}L", amount / LAKH)
    } else {
        format_inr(amount)
    }
}

/// Last three digits, then groups of two: 12345678 -> 1,23,45,678.
fn group_indian(value: u64) -> String {
    let raw = value.to_string();
    if raw.len() <= 3 {
        return raw;
    }

    let (head, tail) = raw.split_at(raw.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

/// "5 minutes ago", "about 2 hours ago", "in 3 days".
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds();
    let distance = distance_in_words(seconds.unsigned_abs() as f64 / 60.0);

    if seconds >= 0 {
        format!("{distance} ago")
    } else {
        format!("in {distance}")
    }
}

fn distance_in_words(minutes: f64) -> String {
    const HOUR: f64 = 60.0;
    const DAY: f64 = 24.0 * HOUR;
    const MONTH: f64 = 30.0 * DAY;
    const YEAR: f64 = 365.0 * DAY;

    if minutes < 0.5 {
        "less than a minute".to_string()
    } else if minutes < 1.5 {
        "1 minute".to_string()
    } else if minutes < 44.5 {
        format!("{} minutes", minutes.round())
    } else if minutes < 89.5 {
        "about 1 hour".to_string()
    } else if minutes < DAY - 0.5 {
        format!("about {} hours", (minutes / HOUR).round())
    } else if minutes < 42.0 * HOUR - 0.5 {
        "1 day".to_string()
    } else if minutes < MONTH - 0.5 {
        format!("{} days", (minutes / DAY).round())
    } else if minutes < 45.0 * DAY - 0.5 {
        "about 1 month".to_string()
    } else if minutes < 60.0 * DAY - 0.5 {
        "about 2 months".to_string()
    } else if minutes < YEAR {
        format!("{} months", (minutes / MONTH).round())
    } else {
        let months = (minutes / (YEAR / 12.0)).floor() as u64;
        let years = months / 12;
        let plural = |n: u64| if n == 1 { "year" } else { "years" };

        match months % 12 {
            0..=2 => format!("about {years} {}", plural(years)),
            3..=8 => format!("over {years} {}", plural(years)),
            _ => format!("almost {} years", years + 1),
        }
    }
}

pub fn clock_time(timestamp: DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp.with_timezone(&offset).format("%I:%M %p").to_string()
}
