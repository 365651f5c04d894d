use std::path::Path;

use quicklink_core::SyncReport;
use quicklink_storage_json::{export_collection, import_from};

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "backup",
            "Back up the local data file",
            "backup [note]",
            cmd_backup,
        ),
        CommandEntry::new(
            "backups",
            "List local data backups, newest first",
            "backups",
            cmd_backups,
        ),
        CommandEntry::new(
            "restore",
            "Replace the local data file with a backup",
            "restore <backup id>",
            cmd_restore,
        ),
        CommandEntry::new(
            "export",
            "Write every shortcut and category to a JSON file",
            "export <path>",
            cmd_export,
        ),
        CommandEntry::new(
            "import",
            "Merge shortcuts and categories from a JSON file",
            "import <path>",
            cmd_import,
        ),
        CommandEntry::new(
            "seed",
            "Load sample shortcuts into an empty store",
            "seed",
            cmd_seed,
        ),
    ]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = args.join(" ");
    let note = Some(note.as_str()).filter(|note| !note.trim().is_empty());
    let info = context.storage.local().backend().backup(note)?;
    io::print_success(format!("Backup saved as {}.", info.id));
    if context.storage.requested().is_cloud() {
        io::print_hint("Backups cover the local data file only.");
    }
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.storage.local().backend().list_backups()?;
    if backups.is_empty() {
        io::print_info("No backups yet. Use `backup [note]`.");
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::left("Backup"),
        TableColumn::left("Created"),
        TableColumn::left("Kind"),
        TableColumn::right("Size"),
    ]);
    for backup in &backups {
        table.push(vec![
            backup.id.clone(),
            backup
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
            if backup.note.is_some() { "named" } else { "auto" }.to_string(),
            format!("{} B", backup.size_bytes),
        ]);
    }
    output::section(format!("Backups ({})", backups.len()));
    output::line(table.render());
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [backup_id] = args else {
        return Err(CommandError::InvalidArguments("usage: restore <backup id>".into()));
    };
    if !context.confirm(&format!(
        "Replace the local data file with `{}`? The current file is backed up first.",
        backup_id
    ))? {
        io::print_info("Operation cancelled.");
        return Ok(());
    }

    let restored = context.storage.local().backend().restore(backup_id)?;
    context.refresh_manager();
    io::print_success(format!(
        "Restored {} shortcuts and {} categories from {}.",
        restored.shortcuts.len(),
        restored.categories.len(),
        backup_id
    ));
    if context.storage.label() != "local" {
        io::print_hint("Cloud data is unchanged; run `storage sync` to upload restored records.");
    }
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(CommandError::InvalidArguments("usage: export <path>".into()));
    };
    let collection = context.manager.collection()?;
    export_collection(Path::new(path), &collection)?;
    io::print_success(format!(
        "Exported {} shortcuts and {} categories to {}.",
        collection.shortcuts.len(),
        collection.categories.len(),
        path
    ));
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(CommandError::InvalidArguments("usage: import <path>".into()));
    };
    let incoming = import_from(Path::new(path))?;
    let report = context.manager.import(&incoming)?;
    report_merge(&report, "Imported");
    Ok(())
}

fn cmd_seed(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let report = context.manager.seed_sample()?;
    report_merge(&report, "Loaded sample data:");
    io::print_hint("Try `list` or `due 30`.");
    Ok(())
}

fn report_merge(report: &SyncReport, verb: &str) {
    if report.is_empty() {
        io::print_info("Nothing new to add; every record already exists.");
    } else {
        io::print_success(format!(
            "{} {} categories and {} shortcuts.",
            verb, report.categories, report.shortcuts
        ));
    }
    if report.skipped > 0 {
        io::print_warning(format!(
            "Skipped {} invalid record(s); see the log for details.",
            report.skipped
        ));
    }
}
