use quicklink_core::CoreError;
use quicklink_domain::{Collection, Shortcut, ShortcutDraft};

use crate::cli::args::{parse_amount, parse_date, parse_frequency, ParsedArgs};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::format;
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

const ADD_USAGE: &str = concat!(
    "shortcut add <name> <url> [--category <id|name>] [--date YYYY-MM-DD] [--amount N] ",
    "[--frequency monthly|yearly]",
);
const EDIT_USAGE: &str = concat!(
    "shortcut edit <id|name> [--name N] [--url U] [--category C] [--date D] [--amount N] ",
    "[--frequency F] [--clear-payment] [--clear-category]",
);

const ADD_FLAGS: &[&str] = &["category", "date", "amount", "frequency"];
const EDIT_FLAGS: &[&str] = &["name", "url", "category", "date", "amount", "frequency"];
const EDIT_SWITCHES: &[&str] = &["clear-payment", "clear-category"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "shortcut",
        "Add, edit, remove, or inspect shortcuts",
        concat!(
            "shortcut add <name> <url> [--category <id|name>] [--date YYYY-MM-DD] [--amount N] ",
            "[--frequency monthly|yearly]\n",
            "shortcut edit <id|name> [--name N] [--url U] [--category C] [--date D] [--amount N] ",
            "[--frequency F] [--clear-payment] [--clear-category]\n",
            "shortcut remove <id|name>\n",
            "shortcut show <id|name>\n",
            "shortcut list",
        ),
        cmd_shortcut,
    )]
}

fn cmd_shortcut(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: shortcut <add|edit|remove|show|list>".into(),
        ));
    };

    match action.to_lowercase().as_str() {
        "add" => handle_add(context, rest),
        "edit" => handle_edit(context, rest),
        "remove" | "rm" | "delete" => handle_remove(context, rest),
        "show" => handle_show(context, rest),
        "list" | "ls" => handle_list(context),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown shortcut subcommand `{}`",
            other
        ))),
    }
}

fn handle_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, ADD_FLAGS, &[])?;
    let name = parsed.positional(0, ADD_USAGE)?;
    let url = parsed.positional(1, ADD_USAGE)?;
    reject_extra(&parsed, 2)?;

    let mut draft = ShortcutDraft::new(name, url);
    draft.category_id = parsed.value("category").map(str::to_string);
    apply_payment_flags(&mut draft, &parsed)?;
    warn_partial_payment(&draft);

    let shortcut = context.manager.add_shortcut(draft)?;
    io::print_success(format!("Shortcut `{}` added ({}).", shortcut.name, shortcut.id));
    Ok(())
}

fn handle_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, EDIT_FLAGS, EDIT_SWITCHES)?;
    let reference = parsed.positional(0, EDIT_USAGE)?;
    reject_extra(&parsed, 1)?;
    if !parsed.has_options() {
        return Err(CommandError::InvalidArguments(format!(
            "nothing to change; usage: {}",
            EDIT_USAGE
        )));
    }

    let collection = context.manager.collection()?;
    let existing = resolve_shortcut(&collection, reference)?;
    let mut draft = existing.to_draft();

    if let Some(name) = parsed.value("name") {
        draft.name = name.to_string();
    }
    if let Some(url) = parsed.value("url") {
        draft.url = url.to_string();
    }
    if parsed.has("clear-category") {
        draft.category_id = None;
    } else if let Some(category) = parsed.value("category") {
        draft.category_id = Some(category.to_string());
    } else if draft
        .category_id
        .as_deref()
        .is_some_and(|id| collection.category(id).is_none())
    {
        // the category was deleted elsewhere
        draft.category_id = None;
    }
    if parsed.has("clear-payment") {
        draft.payment_date = None;
        draft.payment_amount = None;
        draft.payment_frequency = None;
    }
    apply_payment_flags(&mut draft, &parsed)?;
    warn_partial_payment(&draft);

    let updated = context.manager.update_shortcut(&existing.id, draft)?;
    io::print_success(format!("Shortcut `{}` updated.", updated.name));
    Ok(())
}

fn handle_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let reference = args
        .first()
        .ok_or_else(|| CommandError::InvalidArguments("usage: shortcut remove <id|name>".into()))?;
    let collection = context.manager.collection()?;
    let shortcut = resolve_shortcut(&collection, reference)?;
    context.manager.remove_shortcut(&shortcut.id)?;
    io::print_success(format!("Shortcut `{}` removed.", shortcut.name));
    Ok(())
}

fn handle_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let reference = args
        .first()
        .ok_or_else(|| CommandError::InvalidArguments("usage: shortcut show <id|name>".into()))?;
    let collection = context.manager.collection()?;
    let shortcut = resolve_shortcut(&collection, reference)?;
    let today = context.today();

    output::section(&shortcut.name);
    let mut rows = vec![
        ("Id", shortcut.id.clone()),
        ("URL", shortcut.url.clone()),
        ("Category", format::category_name(&collection, shortcut).to_string()),
        ("Payment", format::payment(shortcut)),
    ];
    if let Some(date) = shortcut.payment_date.filter(|_| shortcut.is_subscription()) {
        rows.push(("Billing date", format::date(date)));
    }
    if let Some(next) = format::next_payment(shortcut, today) {
        let flag = if context.manager.is_due_soon(shortcut) {
            " [due soon]"
        } else {
            ""
        };
        rows.push(("Next payment", format!("{}{}", next, flag)));
    }
    for (label, value) in rows {
        output::line(format!("  {:<13} {}", format!("{}:", label), value));
    }
    Ok(())
}

fn handle_list(context: &mut ShellContext) -> CommandResult {
    let collection = context.manager.collection()?;
    if collection.shortcuts.is_empty() {
        io::print_info("No shortcuts yet. Use `shortcut add <name> <url>` or `seed`.");
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::left("Name").max(24),
        TableColumn::left("URL").max(40),
        TableColumn::left("Category").max(20),
        TableColumn::right("Payment"),
        TableColumn::left("Id"),
    ]);
    for shortcut in &collection.shortcuts {
        table.push(vec![
            shortcut.name.clone(),
            shortcut.url.clone(),
            format::category_name(&collection, shortcut).to_string(),
            format::payment(shortcut),
            shortcut.id.clone(),
        ]);
    }
    output::section(format!("Shortcuts ({})", collection.shortcuts.len()));
    output::line(table.render());
    Ok(())
}

/// Finds a shortcut by exact id, then by name (case-insensitive), then by unique id prefix.
pub(crate) fn resolve_shortcut<'a>(
    collection: &'a Collection,
    reference: &str,
) -> Result<&'a Shortcut, CommandError> {
    let reference = reference.trim();
    if let Some(shortcut) = collection.shortcut(reference) {
        return Ok(shortcut);
    }

    let needle = reference.to_lowercase();
    let by_name: Vec<&Shortcut> = collection
        .shortcuts
        .iter()
        .filter(|shortcut| shortcut.name.trim().to_lowercase() == needle)
        .collect();
    match by_name.as_slice() {
        [single] => return Ok(*single),
        [] => {}
        many => {
            return Err(CommandError::InvalidArguments(format!(
                "`{}` matches {} shortcuts; use the id instead",
                reference,
                many.len()
            )))
        }
    }

    let mut by_prefix = collection
        .shortcuts
        .iter()
        .filter(|shortcut| !reference.is_empty() && shortcut.id.starts_with(reference));
    match (by_prefix.next(), by_prefix.next()) {
        (Some(single), None) => Ok(single),
        _ => Err(CoreError::ShortcutNotFound(reference.to_string()).into()),
    }
}

fn apply_payment_flags(
    draft: &mut ShortcutDraft,
    parsed: &ParsedArgs<'_>,
) -> Result<(), CommandError> {
    if let Some(date) = parsed.value("date") {
        draft.payment_date = Some(parse_date(date)?);
    }
    if let Some(amount) = parsed.value("amount") {
        draft.payment_amount = Some(parse_amount(amount)?);
    }
    if let Some(frequency) = parsed.value("frequency") {
        draft.payment_frequency = Some(parse_frequency(frequency)?);
    }
    Ok(())
}

fn warn_partial_payment(draft: &ShortcutDraft) {
    if draft.payment_date.is_some() != draft.payment_amount.is_some() {
        io::print_warning(
            "Payment details need both --date and --amount; the amount is not tracked.",
        );
    }
}

fn reject_extra(parsed: &ParsedArgs<'_>, expected: usize) -> CommandResult {
    match parsed.positionals.get(expected) {
        Some(extra) => Err(CommandError::InvalidArguments(format!(
            "unexpected argument `{}`; quote values that contain spaces",
            extra
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> Collection {
        Collection::new(
            vec![
                Shortcut::from_draft(
                    "shortcut_aa11",
                    ShortcutDraft::new("GitHub", "https://github.com"),
                ),
                Shortcut::from_draft(
                    "shortcut_bb22",
                    ShortcutDraft::new("Docs", "https://docs.rs"),
                ),
                Shortcut::from_draft(
                    "shortcut_bb33",
                    ShortcutDraft::new("docs", "https://doc.rust-lang.org"),
                ),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn resolves_by_id_name_or_prefix() {
        let collection = collection();
        assert_eq!(resolve_shortcut(&collection, "shortcut_bb22").unwrap().name, "Docs");
        assert_eq!(resolve_shortcut(&collection, "github").unwrap().id, "shortcut_aa11");
        assert_eq!(resolve_shortcut(&collection, "shortcut_a").unwrap().name, "GitHub");
    }

    #[test]
    fn ambiguous_or_missing_references_fail() {
        let collection = collection();
        assert!(matches!(
            resolve_shortcut(&collection, "DOCS"),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(
            resolve_shortcut(&collection, "shortcut_bb"),
            Err(CommandError::Core(CoreError::ShortcutNotFound(_)))
        ));
        assert!(matches!(
            resolve_shortcut(&collection, "gitlab"),
            Err(CommandError::Core(CoreError::ShortcutNotFound(_)))
        ));
    }
}
