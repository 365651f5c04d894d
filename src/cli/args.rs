use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use quicklink_domain::PaymentFrequency;

use crate::cli::core::CommandError;

/// Positional arguments plus `--flag value` / `--flag=value` options.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub positionals: Vec<&'a str>,
    values: HashMap<&'static str, &'a str>,
    switches: HashSet<&'static str>,
}

impl<'a> ParsedArgs<'a> {
    pub fn parse(
        args: &[&'a str],
        value_flags: &[&'static str],
        switch_flags: &[&'static str],
    ) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            let Some(option) = arg.strip_prefix("--") else {
                parsed.positionals.push(arg);
                continue;
            };
            let (name, inline) = match option.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (option, None),
            };
            if let Some(flag) = value_flags.iter().copied().find(|flag| *flag == name) {
                let value = match inline {
                    Some(value) => value,
                    None => iter.next().ok_or_else(|| {
                        CommandError::InvalidArguments(format!("`--{}` expects a value", flag))
                    })?,
                };
                parsed.values.insert(flag, value);
            } else if let Some(flag) = switch_flags.iter().copied().find(|flag| *flag == name) {
                if inline.is_some() {
                    return Err(CommandError::InvalidArguments(format!(
                        "`--{}` does not take a value",
                        flag
                    )));
                }
                parsed.switches.insert(flag);
            } else {
                return Err(CommandError::InvalidArguments(format!("unknown option `{}`", arg)));
            }
        }
        Ok(parsed)
    }

    pub fn value(&self, flag: &str) -> Option<&'a str> {
        self.values.get(flag).copied()
    }

    pub fn has(&self, flag: &str) -> bool {
        self.switches.contains(flag)
    }

    pub fn has_options(&self) -> bool {
        !self.values.is_empty() || !self.switches.is_empty()
    }

    pub fn positional(&self, idx: usize, usage: &str) -> Result<&'a str, CommandError> {
        self.positionals
            .get(idx)
            .copied()
            .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {}", usage)))
    }
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

pub(crate) fn parse_amount(input: &str) -> Result<f64, CommandError> {
    let cleaned = input.trim().trim_start_matches('$');
    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(amount),
        _ => Err(CommandError::InvalidArguments(format!(
            "invalid amount `{}` (use a non-negative number)",
            input
        ))),
    }
}

pub(crate) fn parse_frequency(input: &str) -> Result<PaymentFrequency, CommandError> {
    input.parse().map_err(CommandError::InvalidArguments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_positionals_values_and_switches() {
        let args = ["Netflix", "--amount", "15.99", "--frequency=yearly", "--clear-category"];
        let parsed =
            ParsedArgs::parse(&args, &["amount", "frequency"], &["clear-category"]).unwrap();
        assert_eq!(parsed.positionals, vec!["Netflix"]);
        assert_eq!(parsed.value("amount"), Some("15.99"));
        assert_eq!(parsed.value("frequency"), Some("yearly"));
        assert!(parsed.has("clear-category"));
        assert!(!parsed.has("clear-payment"));
    }

    #[test]
    fn rejects_unknown_and_incomplete_options() {
        assert!(ParsedArgs::parse(&["--colour", "red"], &["category"], &[]).is_err());
        assert!(ParsedArgs::parse(&["--category"], &["category"], &[]).is_err());
        assert!(ParsedArgs::parse(&["--yes=no"], &[], &["yes"]).is_err());
    }

    #[test]
    fn parses_amounts_and_dates() {
        assert_eq!(parse_amount("$9.99").unwrap(), 9.99);
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("NaN").is_err());
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("29/02/2024").is_err());
        assert_eq!(parse_frequency("Yearly").unwrap(), PaymentFrequency::Yearly);
    }
}
