//! Text helpers shared by the listing commands.

use chrono::NaiveDate;
use quicklink_core::{PaymentService, UNCATEGORIZED_LABEL};
use quicklink_domain::{Collection, Shortcut};

pub fn amount(value: f64) -> String {
    format!("${:.2}", value)
}

pub fn date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// `$15.99 monthly`, or `-` for shortcuts without payment details.
pub fn payment(shortcut: &Shortcut) -> String {
    match shortcut.payment_amount {
        Some(value) if shortcut.is_subscription() => {
            format!("{} {}", amount(value), shortcut.frequency())
        }
        _ => "-".to_string(),
    }
}

pub fn category_name<'a>(collection: &'a Collection, shortcut: &Shortcut) -> &'a str {
    shortcut
        .category_id
        .as_deref()
        .and_then(|id| collection.category(id))
        .map(|category| category.name.as_str())
        .unwrap_or(UNCATEGORIZED_LABEL)
}

/// `2024-02-15 (in 3 days)`; `None` for shortcuts without payment details.
pub fn next_payment(shortcut: &Shortcut, today: NaiveDate) -> Option<String> {
    let due = PaymentService::next_payment_date(shortcut, today)?;
    Some(format!("{} ({})", date(due), relative_days((due - today).num_days())))
}

pub fn relative_days(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("in {} days", n),
    }
}
