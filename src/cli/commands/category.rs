use crate::cli::args::ParsedArgs;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "category",
        "Manage the categories shortcuts are grouped by",
        "category add <name>
         category rename <id|name> <new name>
         category remove <id|name> [--yes]
         category list",
        cmd_category,
    )]
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: category <add|rename|remove|list>".into(),
        ));
    };

    match action.to_lowercase().as_str() {
        "add" => handle_add(context, rest),
        "rename" | "edit" => handle_rename(context, rest),
        "remove" | "rm" | "delete" => handle_remove(context, rest),
        "list" | "ls" => handle_list(context),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown category subcommand `{}`",
            other
        ))),
    }
}

fn handle_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(CommandError::InvalidArguments("usage: category add <name>".into()));
    }
    let category = context.manager.add_category(&args.join(" "))?;
    io::print_success(format!("Category `{}` added ({}).", category.name, category.id));
    Ok(())
}

fn handle_rename(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference, name @ ..] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: category rename <id|name> <new name>".into(),
        ));
    };
    if name.is_empty() {
        return Err(CommandError::InvalidArguments(
            "usage: category rename <id|name> <new name>".into(),
        ));
    }
    let category = context.manager.rename_category(reference, &name.join(" "))?;
    io::print_success(format!("Category renamed to `{}`.", category.name));
    Ok(())
}

fn handle_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &["yes"])?;
    let reference = parsed.positional(0, "category remove <id|name> [--yes]")?;

    let collection = context.manager.collection()?;
    let category = quicklink_core::CategoryService::resolve(&collection, reference)?;
    let affected = collection.shortcuts_in(&category.id).count();

    if !parsed.has("yes") {
        let prompt = format!(
            "Remove category `{}`? {} shortcut(s) will become uncategorized.",
            category.name, affected
        );
        if !context.confirm(&prompt)? {
            io::print_info("Operation cancelled.");
            return Ok(());
        }
    }

    let removed = context.manager.remove_category(&category.id)?;
    io::print_success(format!("Category `{}` removed.", removed.name));
    if affected > 0 {
        io::print_info(format!("{} shortcut(s) moved to Uncategorized.", affected));
    }
    Ok(())
}

fn handle_list(context: &mut ShellContext) -> CommandResult {
    let collection = context.manager.collection()?;
    if collection.categories.is_empty() {
        io::print_info("No categories yet. Use `category add <name>`.");
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::left("Name").max(30),
        TableColumn::right("Shortcuts"),
        TableColumn::left("Id"),
    ]);
    for category in &collection.categories {
        table.push(vec![
            category.name.clone(),
            collection.shortcuts_in(&category.id).count().to_string(),
            category.id.clone(),
        ]);
    }
    output::section(format!("Categories ({})", collection.categories.len()));
    output::line(table.render());
    Ok(())
}
