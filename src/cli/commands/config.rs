use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

/// Settings that change how the store is opened.
const STORAGE_KEYS: &[&str] = &[
    "storage_mode",
    "user_id",
    "data_dir",
    "backup_retention",
    "probe_timeout_ms",
    "max_reconnect_attempts",
    "monitor_interval_secs",
];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "Show or change settings",
        "config show
         config set <key> <value>
         config backup [note]
         config backups
         config restore <backup name>",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return handle_show(context);
    };

    match action.to_lowercase().as_str() {
        "show" => handle_show(context),
        "set" => handle_set(context, rest),
        "backup" => handle_backup(context, rest),
        "backups" => handle_backups(context),
        "restore" => handle_restore(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config subcommand `{}`",
            other
        ))),
    }
}

fn handle_show(context: &mut ShellContext) -> CommandResult {
    let mut table = Table::new(vec![
        TableColumn::left("Setting"),
        TableColumn::left("Value").max(50),
    ]);
    for (key, value) in context.config.entries() {
        table.push(vec![key.to_string(), value]);
    }
    output::section("Configuration");
    output::line(table.render());
    io::print_info(format!(
        "Stored at {}",
        context.config_manager.config_path().display()
    ));
    Ok(())
}

fn handle_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [key, value @ ..] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: config set <key> <value>".into(),
        ));
    };
    if value.is_empty() {
        return Err(CommandError::InvalidArguments(
            "usage: config set <key> <value>".into(),
        ));
    }
    let key = key.to_lowercase();

    // environment overrides stay out of the saved file
    let mut stored = context.config_manager.load_file()?;
    stored.set(&key, &value.join(" "))?;
    context.config_manager.save(&stored)?;
    context.config = context.config_manager.load()?;
    io::apply_config(&context.config);
    io::print_success(format!("Updated `{}`.", key));

    if affects_storage(&key) {
        context.reload_storage()?;
    }
    Ok(())
}

fn handle_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = args.join(" ");
    let note = Some(note.as_str()).filter(|note| !note.trim().is_empty());
    let stored = context.config_manager.load_file()?;
    let name = context.config_manager.backup(&stored, note)?;
    io::print_success(format!("Configuration backed up as {}.", name));
    Ok(())
}

fn handle_backups(context: &mut ShellContext) -> CommandResult {
    let backups = context.config_manager.list_backups()?;
    if backups.is_empty() {
        io::print_info("No configuration backups yet. Use `config backup [note]`.");
        return Ok(());
    }
    output::section(format!("Configuration backups ({})", backups.len()));
    for name in backups {
        output::line(format!("  {}", name));
    }
    Ok(())
}

fn handle_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [name] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: config restore <backup name>".into(),
        ));
    };
    if !context.confirm(&format!("Replace the current configuration with `{}`?", name))? {
        io::print_info("Operation cancelled.");
        return Ok(());
    }
    context.config_manager.restore(name)?;
    context.config = context.config_manager.load()?;
    io::apply_config(&context.config);
    io::print_success(format!("Configuration restored from {}.", name));
    context.reload_storage()
}

fn affects_storage(key: &str) -> bool {
    STORAGE_KEYS.contains(&key)
        || ["supabase.", "firebase.", "sheets."]
            .iter()
            .any(|prefix| key.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_settings_trigger_reload() {
        assert!(affects_storage("storage_mode"));
        assert!(affects_storage("supabase.anon_key"));
        assert!(affects_storage("sheets.access_token"));
        assert!(!affects_storage("ui_color_enabled"));
        assert!(!affects_storage("plain_output"));
    }
}
