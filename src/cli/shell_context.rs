use std::sync::Arc;

use dialoguer::theme::ColorfulTheme;
use quicklink_config::{Config, ConfigManager};
use quicklink_core::{Clock, ShortcutManager};

use super::backend::Storage;
use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub storage: Storage,
    pub manager: ShortcutManager,
    pub clock: Arc<dyn Clock>,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn status(&self) -> String {
        format!(
            "ShellContext {{ running: {}, storage: {}, last_command: {:?} }}",
            self.running,
            self.storage.label(),
            self.last_command
        )
    }
}
