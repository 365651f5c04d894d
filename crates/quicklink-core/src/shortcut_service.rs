use quicklink_domain::{Collection, ShortcutDraft};
use url::Url;

use crate::CoreError;

pub struct ShortcutService;

impl ShortcutService {
    /// Validates and normalizes user input before it reaches a store.
    pub fn prepare(draft: ShortcutDraft) -> Result<ShortcutDraft, CoreError> {
        let name = draft.name.trim().to_string();
        let raw_url = draft.url.trim();
        if name.is_empty() || raw_url.is_empty() {
            return Err(CoreError::Validation("name and URL are required".into()));
        }
        let url = Self::normalize_url(raw_url)?;

        if let Some(amount) = draft.payment_amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(CoreError::Validation(
                    "payment amount must be a non-negative number".into(),
                ));
            }
        }

        let is_subscription = draft.payment_date.is_some() && draft.payment_amount.is_some();
        let category_id = draft
            .category_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(ShortcutDraft {
            name,
            url,
            payment_date: draft.payment_date,
            payment_amount: if is_subscription {
                draft.payment_amount
            } else {
                None
            },
            payment_frequency: if is_subscription {
                Some(draft.payment_frequency.unwrap_or_default())
            } else {
                None
            },
            category_id,
        })
    }

    /// Adds an `https://` scheme when none is present and checks the result parses.
    pub fn normalize_url(raw: &str) -> Result<String, CoreError> {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };
        match Url::parse(&candidate) {
            Ok(parsed) if parsed.host_str().is_some_and(|host| !host.is_empty()) => Ok(candidate),
            _ => Err(CoreError::Validation(format!("invalid URL `{}`", raw))),
        }
    }

    /// Ensures the draft's category, when set, exists in `collection`.
    pub fn check_category(collection: &Collection, draft: &ShortcutDraft) -> Result<(), CoreError> {
        match draft.category_id.as_deref() {
            Some(id) if collection.category(id).is_none() => {
                Err(CoreError::CategoryNotFound(id.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use quicklink_domain::PaymentFrequency;

    use super::*;

    #[test]
    fn requires_name_and_url() {
        let err = ShortcutService::prepare(ShortcutDraft::new("  ", "example.com")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        let err = ShortcutService::prepare(ShortcutDraft::new("Example", " ")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn adds_https_scheme_when_missing() {
        let draft =
            ShortcutService::prepare(ShortcutDraft::new(" Example ", "example.com")).unwrap();
        assert_eq!(draft.name, "Example");
        assert_eq!(draft.url, "https://example.com");

        let draft =
            ShortcutService::prepare(ShortcutDraft::new("Plain", "HTTP://plain.example")).unwrap();
        assert_eq!(draft.url, "HTTP://plain.example");
    }

    #[test]
    fn rejects_unparseable_urls() {
        assert!(ShortcutService::normalize_url("https://").is_err());
        assert!(ShortcutService::normalize_url("exa mple.com").is_err());
    }

    #[test]
    fn payment_amount_without_date_is_dropped() {
        let mut draft = ShortcutDraft::new("Netflix", "netflix.com");
        draft.payment_amount = Some(15.49);
        draft.payment_frequency = Some(PaymentFrequency::Yearly);
        let prepared = ShortcutService::prepare(draft).unwrap();
        assert_eq!(prepared.payment_amount, None);
        assert_eq!(prepared.payment_frequency, None);
    }

    #[test]
    fn payment_date_without_amount_is_kept() {
        let mut draft = ShortcutDraft::new("Gym", "gym.example");
        draft.payment_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        let prepared = ShortcutService::prepare(draft).unwrap();
        assert_eq!(prepared.payment_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(prepared.payment_frequency, None);
    }

    #[test]
    fn subscription_frequency_defaults_to_monthly() {
        let mut draft = ShortcutDraft::new("Spotify", "spotify.com");
        draft.payment_date = NaiveDate::from_ymd_opt(2024, 1, 14);
        draft.payment_amount = Some(9.99);
        let prepared = ShortcutService::prepare(draft).unwrap();
        assert_eq!(prepared.payment_frequency, Some(PaymentFrequency::Monthly));
    }

    #[test]
    fn rejects_negative_amounts() {
        let draft = ShortcutDraft::new("Bad", "bad.example").with_payment(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            -1.0,
            PaymentFrequency::Monthly,
        );
        assert!(ShortcutService::prepare(draft).is_err());
    }
}
