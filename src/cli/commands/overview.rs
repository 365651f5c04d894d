use quicklink_core::{PaymentService, DUE_SOON_DAYS};

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::format;
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "list",
            "Show shortcuts grouped by category",
            "list",
            cmd_list,
        ),
        CommandEntry::new(
            "summary",
            "Show this month's payment total and subscription count",
            "summary",
            cmd_summary,
        ),
        CommandEntry::new(
            "due",
            "Show upcoming subscription payments",
            "due [days]",
            cmd_due,
        ),
    ]
}

fn cmd_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let groups = context.manager.groups()?;
    if groups.is_empty() {
        io::print_info("No shortcuts yet. Use `shortcut add <name> <url>` or `seed`.");
        return Ok(());
    }

    let today = context.today();
    for group in groups {
        output::section(format!("{} ({})", group.name, group.shortcuts.len()));
        for shortcut in &group.shortcuts {
            let mut line = format!("  {:<24} {}", shortcut.name, shortcut.url);
            if let Some(next) = format::next_payment(shortcut, today) {
                line.push_str(&format!("  [{}, next {}]", format::payment(shortcut), next));
                if context.manager.is_due_soon(shortcut) {
                    line.push_str("  (due soon)");
                }
            }
            output::line(line);
        }
    }
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let shortcuts = context.manager.store().list_shortcuts()?;
    let today = context.today();
    let total = PaymentService::monthly_total(&shortcuts, today);
    let subscriptions = PaymentService::subscription_count(&shortcuts);
    let due_soon = shortcuts
        .iter()
        .filter(|shortcut| PaymentService::shortcut_due_soon(shortcut, today))
        .count();

    output::section(format!("Summary for {}", today.format("%B %Y")));
    output::line(format!("  Shortcuts:             {}", shortcuts.len()));
    output::line(format!("  Subscriptions:         {}", subscriptions));
    output::line(format!("  Payments this month:   {}", format::amount(total)));
    output::line(format!("  Due in next {} days:    {}", DUE_SOON_DAYS, due_soon));
    Ok(())
}

fn cmd_due(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let days = match args.first() {
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|days| *days >= 0)
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!(
                    "invalid day count `{}`; usage: due [days]",
                    raw
                ))
            })?,
        None => DUE_SOON_DAYS,
    };

    let upcoming = context.manager.upcoming(days)?;
    if upcoming.is_empty() {
        io::print_info(format!("No payments due in the next {} days.", days));
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::left("Due"),
        TableColumn::left("When"),
        TableColumn::left("Name").max(24),
        TableColumn::right("Amount"),
        TableColumn::left("Frequency"),
    ]);
    for payment in &upcoming {
        table.push(vec![
            format::date(payment.due_on),
            format::relative_days(payment.days_until),
            payment.name.clone(),
            format::amount(payment.amount),
            payment.frequency.to_string(),
        ]);
    }
    let total: f64 = upcoming.iter().map(|payment| payment.amount).sum();
    output::section(format!("Due in the next {} days", days));
    output::line(table.render());
    io::print_info(format!(
        "{} payment(s) totalling {}.",
        upcoming.len(),
        format::amount(total)
    ));
    Ok(())
}
