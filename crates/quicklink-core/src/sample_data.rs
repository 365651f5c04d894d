//! Starter data offered to empty stores.

use chrono::NaiveDate;
use quicklink_domain::{Category, Collection, PaymentFrequency, Shortcut, ShortcutDraft};

const CATEGORIES: &[(&str, &str)] = &[
    ("search", "Search Engines"),
    ("ai", "AI Tools"),
    ("social", "Social Media"),
    ("productivity", "Productivity"),
    ("development", "Development"),
    ("entertainment", "Entertainment"),
];

type Billing = Option<(f64, PaymentFrequency, (i32, u32, u32))>;

type SampleRow = (&'static str, &'static str, &'static str, Option<&'static str>, Billing);

/// Billed monthly from the given day of January 2024.
const fn monthly(amount: f64, day: u32) -> Billing {
    Some((amount, PaymentFrequency::Monthly, (2024, 1, day)))
}

const fn yearly(amount: f64, month: u32, day: u32) -> Billing {
    Some((amount, PaymentFrequency::Yearly, (2024, month, day)))
}

const SHORTCUTS: &[SampleRow] = &[
    ("google", "Google", "https://google.com", Some("search"), None),
    ("bing", "Bing", "https://bing.com", Some("search"), None),
    ("duckduckgo", "DuckDuckGo", "https://duckduckgo.com", Some("search"), None),
    ("chatgpt", "ChatGPT", "https://chat.openai.com", Some("ai"), monthly(20.0, 15)),
    ("claude", "Claude", "https://claude.ai", Some("ai"), monthly(20.0, 20)),
    ("gemini", "Gemini", "https://gemini.google.com", Some("ai"), None),
    ("twitter", "X (Twitter)", "https://x.com", Some("social"), monthly(8.0, 10)),
    ("linkedin", "LinkedIn", "https://linkedin.com", Some("social"), monthly(59.99, 5)),
    ("instagram", "Instagram", "https://instagram.com", Some("social"), None),
    ("notion", "Notion", "https://notion.so", Some("productivity"), monthly(10.0, 12)),
    ("todoist", "Todoist", "https://todoist.com", Some("productivity"), monthly(4.0, 8)),
    ("calendly", "Calendly", "https://calendly.com", Some("productivity"), monthly(8.0, 18)),
    ("github", "GitHub", "https://github.com", Some("development"), monthly(4.0, 25)),
    ("vercel", "Vercel", "https://vercel.com", Some("development"), monthly(20.0, 30)),
    ("netlify", "Netlify", "https://netlify.com", Some("development"), None),
    ("netflix", "Netflix", "https://netflix.com", Some("entertainment"), monthly(15.49, 22)),
    ("spotify", "Spotify", "https://spotify.com", Some("entertainment"), monthly(9.99, 14)),
    ("youtube", "YouTube", "https://youtube.com", Some("entertainment"), monthly(11.99, 17)),
    ("amazon", "Amazon", "https://amazon.com", None, yearly(139.0, 3, 15)),
    ("dropbox", "Dropbox", "https://dropbox.com", None, yearly(120.0, 6, 1)),
];

/// Builds the starter collection of popular sites and subscriptions.
pub fn sample_collection() -> Collection {
    let categories = CATEGORIES
        .iter()
        .map(|(id, name)| Category::with_id(*id, *name))
        .collect();
    let shortcuts = SHORTCUTS
        .iter()
        .map(|(id, name, url, category, payment)| {
            let mut draft = ShortcutDraft::new(*name, *url);
            draft.category_id = category.map(str::to_string);
            if let Some((amount, frequency, (y, m, d))) = payment {
                if let Some(date) = NaiveDate::from_ymd_opt(*y, *m, *d) {
                    draft = draft.with_payment(date, *amount, *frequency);
                }
            }
            Shortcut::from_draft(*id, draft)
        })
        .collect();
    Collection::new(shortcuts, categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_references_only_known_categories() {
        let sample = sample_collection();
        assert_eq!(sample.categories.len(), 6);
        assert_eq!(sample.shortcuts.len(), 20);
        for shortcut in &sample.shortcuts {
            if let Some(id) = shortcut.category_id.as_deref() {
                assert!(sample.category(id).is_some(), "unknown category {id}");
            }
        }
    }
}
