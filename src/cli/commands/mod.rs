pub mod category;
pub mod config;
pub mod data;
pub mod overview;
pub mod shortcut;
pub mod storage;
pub mod system;

use crate::cli::registry::{CommandEntry, CommandRegistry};

const ROOT_COMMAND_ORDER: &[&str] = &[
    "list",
    "shortcut",
    "category",
    "summary",
    "due",
    "storage",
    "backup",
    "backups",
    "restore",
    "export",
    "import",
    "seed",
    "config",
    "help",
    "version",
    "exit",
];

pub(crate) fn all_entries() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(shortcut::definitions());
    commands.extend(category::definitions());
    commands.extend(overview::definitions());
    commands.extend(storage::definitions());
    commands.extend(data::definitions());
    commands.extend(config::definitions());
    commands.extend(system::definitions());
    commands
}

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let mut entries = all_entries();
    entries.sort_by_key(|entry| {
        ROOT_COMMAND_ORDER
            .iter()
            .position(|name| entry.name.eq_ignore_ascii_case(name))
            .unwrap_or(ROOT_COMMAND_ORDER.len())
    });
    for entry in entries {
        registry.register(entry);
    }
}
