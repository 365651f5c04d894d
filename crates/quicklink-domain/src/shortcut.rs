//! Domain types representing saved shortcuts and their payment metadata.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// A saved link, optionally tracking a recurring payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shortcut {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_frequency: Option<PaymentFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl Shortcut {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::from_draft(generate_shortcut_id(), ShortcutDraft::new(name, url))
    }

    pub fn from_draft(id: impl Into<String>, draft: ShortcutDraft) -> Self {
        Self {
            id: id.into(),
            name: draft.name,
            url: draft.url,
            payment_date: draft.payment_date,
            payment_amount: draft.payment_amount,
            payment_frequency: draft.payment_frequency,
            category_id: draft.category_id,
        }
    }

    /// Returns the shortcut without its id, e.g. for re-inserting elsewhere.
    pub fn to_draft(&self) -> ShortcutDraft {
        ShortcutDraft {
            name: self.name.clone(),
            url: self.url.clone(),
            payment_date: self.payment_date,
            payment_amount: self.payment_amount,
            payment_frequency: self.payment_frequency,
            category_id: self.category_id.clone(),
        }
    }

    /// Returns `true` when both a payment date and an amount are recorded.
    pub fn is_subscription(&self) -> bool {
        self.payment_date.is_some() && self.payment_amount.is_some()
    }

    /// Frequency of the recurring payment; monthly when unspecified.
    pub fn frequency(&self) -> PaymentFrequency {
        self.payment_frequency.unwrap_or_default()
    }

    pub fn clear_payment(&mut self) {
        self.payment_date = None;
        self.payment_amount = None;
        self.payment_frequency = None;
    }
}

impl Identifiable for Shortcut {
    fn id(&self) -> &str {
        &self.id
    }
}

impl NamedEntity for Shortcut {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Shortcut {
    fn display_label(&self) -> String {
        format!("{} <{}>", self.name, self.url)
    }
}

/// Shortcut fields supplied by the user before an id is assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutDraft {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_frequency: Option<PaymentFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl ShortcutDraft {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_payment(
        mut self,
        date: NaiveDate,
        amount: f64,
        frequency: PaymentFrequency,
    ) -> Self {
        self.payment_date = Some(date);
        self.payment_amount = Some(amount);
        self.payment_frequency = Some(frequency);
        self
    }
}

/// Supported billing cadences.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Yearly,
}

impl PaymentFrequency {
    /// Advances `date` by one billing period.
    pub fn advance(self, date: NaiveDate) -> NaiveDate {
        match self {
            PaymentFrequency::Monthly => shift_month(date, 1),
            PaymentFrequency::Yearly => shift_year(date, 1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentFrequency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" | "m" => Ok(PaymentFrequency::Monthly),
            "yearly" | "year" | "annual" | "y" => Ok(PaymentFrequency::Yearly),
            other => Err(format!(
                "unknown payment frequency `{}` (expected monthly or yearly)",
                other
            )),
        }
    }
}

/// Generates an id for a shortcut created in local storage.
pub fn generate_shortcut_id() -> String {
    format!("shortcut_{}", Uuid::new_v4().simple())
}
