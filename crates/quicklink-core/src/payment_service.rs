//! Recurring-payment calculations over subscription shortcuts.

use chrono::{Datelike, NaiveDate};
use quicklink_domain::{PaymentFrequency, Shortcut};

/// Days ahead within which a payment is flagged as due soon.
pub const DUE_SOON_DAYS: i64 = 7;

/// A subscription's next payment relative to a reference date.
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingPayment {
    pub shortcut_id: String,
    pub name: String,
    pub amount: f64,
    pub frequency: PaymentFrequency,
    pub due_on: NaiveDate,
    pub days_until: i64,
}

pub struct PaymentService;

impl PaymentService {
    /// `true` when `date` falls between today and the next [`DUE_SOON_DAYS`] days.
    pub fn is_due_soon(date: NaiveDate, today: NaiveDate) -> bool {
        let days = (date - today).num_days();
        (0..=DUE_SOON_DAYS).contains(&days)
    }

    /// Total owed this month: every monthly subscription, plus yearly ones billed this month.
    pub fn monthly_total(shortcuts: &[Shortcut], today: NaiveDate) -> f64 {
        shortcuts
            .iter()
            .filter_map(|shortcut| {
                let date = shortcut.payment_date?;
                let amount = shortcut.payment_amount?;
                match shortcut.frequency() {
                    PaymentFrequency::Monthly => Some(amount),
                    PaymentFrequency::Yearly if date.month() == today.month() => Some(amount),
                    PaymentFrequency::Yearly => None,
                }
            })
            .sum()
    }

    /// First payment on or after `today`, rolling the recorded date forward by its frequency.
    ///
    /// Only the date is needed; a shortcut without an amount still has a billing day.
    pub fn next_payment_date(shortcut: &Shortcut, today: NaiveDate) -> Option<NaiveDate> {
        let anchor = shortcut.payment_date?;
        let frequency = shortcut.frequency();
        let mut step = 0;
        let mut next = anchor;
        while next < today {
            step += 1;
            next = match frequency {
                PaymentFrequency::Monthly => quicklink_domain::shift_month(anchor, step),
                PaymentFrequency::Yearly => quicklink_domain::shift_year(anchor, step),
            };
        }
        Some(next)
    }

    /// Whether the shortcut's next payment is due soon.
    pub fn shortcut_due_soon(shortcut: &Shortcut, today: NaiveDate) -> bool {
        Self::next_payment_date(shortcut, today)
            .map(|date| Self::is_due_soon(date, today))
            .unwrap_or(false)
    }

    /// Subscriptions whose next payment lands within `within_days`, soonest first.
    pub fn upcoming(
        shortcuts: &[Shortcut],
        today: NaiveDate,
        within_days: i64,
    ) -> Vec<UpcomingPayment> {
        let mut rows: Vec<UpcomingPayment> = shortcuts
            .iter()
            .filter_map(|shortcut| {
                let amount = shortcut.payment_amount?;
                let due_on = Self::next_payment_date(shortcut, today)?;
                let days_until = (due_on - today).num_days();
                if days_until > within_days {
                    return None;
                }
                Some(UpcomingPayment {
                    shortcut_id: shortcut.id.clone(),
                    name: shortcut.name.clone(),
                    amount,
                    frequency: shortcut.frequency(),
                    due_on,
                    days_until,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.due_on.cmp(&b.due_on).then_with(|| a.name.cmp(&b.name)));
        rows
    }

    /// Number of shortcuts carrying subscription data.
    pub fn subscription_count(shortcuts: &[Shortcut]) -> usize {
        shortcuts.iter().filter(|shortcut| shortcut.is_subscription()).count()
    }
}

#[cfg(test)]
mod tests {
    use quicklink_domain::ShortcutDraft;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn subscription(
        name: &str,
        paid: NaiveDate,
        amount: f64,
        frequency: PaymentFrequency,
    ) -> Shortcut {
        let draft =
            ShortcutDraft::new(name, "https://example.com").with_payment(paid, amount, frequency);
        Shortcut::from_draft(name.to_lowercase(), draft)
    }

    #[test]
    fn due_soon_window_is_inclusive() {
        let today = date(2024, 5, 10);
        assert!(PaymentService::is_due_soon(today, today));
        assert!(PaymentService::is_due_soon(date(2024, 5, 17), today));
        assert!(!PaymentService::is_due_soon(date(2024, 5, 18), today));
        assert!(!PaymentService::is_due_soon(date(2024, 5, 9), today));
    }

    #[test]
    fn monthly_total_counts_yearly_only_in_billing_month() {
        let today = date(2024, 3, 2);
        let shortcuts = vec![
            subscription("Netflix", date(2024, 1, 22), 15.5, PaymentFrequency::Monthly),
            subscription("Amazon", date(2024, 3, 15), 139.0, PaymentFrequency::Yearly),
            subscription("Dropbox", date(2024, 6, 1), 120.0, PaymentFrequency::Yearly),
            Shortcut::new("Free", "https://free.example"),
        ];
        assert_eq!(PaymentService::monthly_total(&shortcuts, today), 154.5);
        assert_eq!(PaymentService::subscription_count(&shortcuts), 3);
    }

    #[test]
    fn next_payment_rolls_forward_with_month_end_clamping() {
        let shortcut = subscription("Vercel", date(2024, 1, 31), 20.0, PaymentFrequency::Monthly);
        assert_eq!(
            PaymentService::next_payment_date(&shortcut, date(2024, 2, 10)),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            PaymentService::next_payment_date(&shortcut, date(2024, 3, 1)),
            Some(date(2024, 3, 31))
        );
        let yearly = subscription("Dropbox", date(2024, 6, 1), 120.0, PaymentFrequency::Yearly);
        assert_eq!(
            PaymentService::next_payment_date(&yearly, date(2025, 6, 2)),
            Some(date(2026, 6, 1))
        );
    }

    #[test]
    fn upcoming_is_sorted_and_bounded() {
        let today = date(2024, 1, 10);
        let shortcuts = vec![
            subscription("Claude", date(2024, 1, 20), 20.0, PaymentFrequency::Monthly),
            subscription("Spotify", date(2024, 1, 14), 9.99, PaymentFrequency::Monthly),
            subscription("Dropbox", date(2024, 6, 1), 120.0, PaymentFrequency::Yearly),
        ];
        let rows = PaymentService::upcoming(&shortcuts, today, 7);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Spotify");
        assert_eq!(rows[0].days_until, 4);

        let rows = PaymentService::upcoming(&shortcuts, today, 30);
        let names: Vec<_> = rows.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, vec!["Spotify", "Claude"]);
    }

    #[test]
    fn date_only_shortcut_is_flagged_but_not_billed() {
        let today = date(2024, 5, 10);
        let mut gym = Shortcut::new("Gym", "https://gym.example");
        gym.payment_date = Some(date(2024, 5, 11));

        assert!(PaymentService::shortcut_due_soon(&gym, today));
        assert_eq!(
            PaymentService::next_payment_date(&gym, date(2024, 5, 12)),
            Some(date(2024, 6, 11))
        );
        assert!(PaymentService::upcoming(&[gym.clone()], today, 30).is_empty());
        assert_eq!(PaymentService::monthly_total(&[gym], today), 0.0);
    }
}
