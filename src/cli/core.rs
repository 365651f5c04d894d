//! Dispatch, error reporting, and shell context helpers.

use std::{env, io, path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use dialoguer::theme::ColorfulTheme;
use quicklink_config::{resolve_base_dir, ConfigError, ConfigManager};
use quicklink_core::{Clock, CoreError, FixedClock, ShortcutManager, SystemClock};
use quicklink_remote::ConnectionMode;
use strsim::levenshtein;
use tracing::debug;

pub use crate::errors::CliError;

use super::backend::Storage;
use super::commands;
use super::io as cli_io;
use super::registry::{CommandEntry, CommandRegistry};
pub use super::shell_context::{CliMode, ShellContext};

/// Pins "today" for due-date commands; used by tests and demos.
pub const TODAY_ENV: &str = "QUICKLINK_TODAY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, resolve_base_dir())
    }

    pub fn with_base_dir(mode: CliMode, base_dir: PathBuf) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config_manager = ConfigManager::with_base_dir(base_dir)?;
        let config = config_manager.load()?;
        cli_io::apply_config(&config);

        let clock = clock_from_env()?;
        let (storage, notice) = Storage::open(
            &config,
            config_manager.base_dir(),
            mode == CliMode::Interactive,
        )?;
        if let Some(notice) = notice {
            cli_io::print_warning(notice);
        }
        let manager = ShortcutManager::with_clock(storage.active(), clock.clone());

        Ok(ShellContext {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            config_manager,
            config,
            storage,
            manager,
            clock,
            last_command: None,
            running: true,
        })
    }

    pub(crate) fn mode(&self) -> CliMode {
        self.mode
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn prompt(&self) -> String {
        format!("quicklink [{}]> ", self.storage.label())
    }

    /// Reopens storage after the storage settings changed.
    pub(crate) fn reload_storage(&mut self) -> CommandResult {
        let (storage, notice) = Storage::open(
            &self.config,
            self.config_manager.base_dir(),
            self.mode == CliMode::Interactive,
        )?;
        if let Some(notice) = notice {
            cli_io::print_warning(notice);
        }
        self.storage = storage;
        self.refresh_manager();
        cli_io::print_info(format!("Storage: {}", self.storage.label()));
        Ok(())
    }

    /// Points the manager at whichever store is active now.
    pub(crate) fn refresh_manager(&mut self) {
        self.manager = ShortcutManager::with_clock(self.storage.active(), self.clock.clone());
    }

    /// Prints hybrid mode changes published since the last prompt.
    pub(crate) fn announce_storage_updates(&self) {
        for info in self.storage.drain_updates() {
            match info.mode {
                ConnectionMode::Cloud => cli_io::print_success(format!(
                    "Connected to {}; changes now go to the cloud.",
                    info.cloud_backend
                )),
                _ => cli_io::print_warning(format!(
                    "{} unreachable ({}); working from local storage.",
                    info.cloud_backend,
                    info.last_error.as_deref().unwrap_or("connection lost")
                )),
            }
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            debug!(command, args = args.len(), "dispatching command");
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", name));
            }
        }
    }

    /// Asks before a destructive action; script mode answers yes.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Exit QuickLink?", true).map_err(CliError::from)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(&message);
                cli_io::print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Core(CoreError::ShortcutNotFound(reference)) => {
                cli_io::print_error(format!("Shortcut not found: {}", reference));
                cli_io::print_hint("Use `shortcut list` to see ids and names.");
                Ok(())
            }
            CommandError::Core(CoreError::CategoryNotFound(reference)) => {
                cli_io::print_error(format!("Category not found: {}", reference));
                cli_io::print_hint("Use `category list` to see ids and names.");
                Ok(())
            }
            other => {
                cli_io::print_error(other.to_string());
                Ok(())
            }
        }
    }
}

fn clock_from_env() -> Result<Arc<dyn Clock>, CliError> {
    match env::var(TODAY_ENV) {
        Ok(value) if !value.trim().is_empty() => {
            let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                CliError::Input(format!("{} must be YYYY-MM-DD, got `{}`", TODAY_ENV, value))
            })?;
            Ok(Arc::new(FixedClock::on(date)))
        }
        _ => Ok(Arc::new(SystemClock)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CliError> for CommandError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Core(inner) => CommandError::Core(inner),
            CliError::Config(inner) => CommandError::Config(inner),
            CliError::Input(message) | CliError::Command(message) => {
                CommandError::InvalidArguments(message)
            }
        }
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            CommandError::Config(inner) => CliError::Config(inner),
            other => CliError::Command(other.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) fn script_context(base_dir: &std::path::Path) -> ShellContext {
    ShellContext::with_base_dir(CliMode::Script, base_dir.to_path_buf()).unwrap()
}

#[cfg(test)]
pub(crate) fn process_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, CommandError> {
    let tokens = shell_words::split(line)
        .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
    let Some(raw) = tokens.first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
    context.dispatch(&raw.to_lowercase(), raw, &args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dispatches_known_commands_and_ignores_unknown() {
        let dir = TempDir::new().unwrap();
        let mut context = script_context(dir.path());

        assert_eq!(
            process_line(&mut context, "category add Streaming").unwrap(),
            LoopControl::Continue
        );
        assert_eq!(process_line(&mut context, "lsit").unwrap(), LoopControl::Continue);
        assert_eq!(process_line(&mut context, "EXIT").unwrap(), LoopControl::Exit);

        let collection = context.manager.collection().unwrap();
        assert_eq!(collection.categories.len(), 1);
        assert_eq!(collection.categories[0].name, "Streaming");
    }

    #[test]
    fn shortcut_flags_reach_the_store() {
        let dir = TempDir::new().unwrap();
        let mut context = script_context(dir.path());

        process_line(&mut context, "category add Video").unwrap();
        process_line(
            &mut context,
            "shortcut add Netflix netflix.com --category video --date 2024-01-15 --amount 15.99",
        )
        .unwrap();

        let collection = context.manager.collection().unwrap();
        let shortcut = &collection.shortcuts[0];
        assert_eq!(shortcut.url, "https://netflix.com");
        assert_eq!(shortcut.payment_amount, Some(15.99));
        assert_eq!(shortcut.category_id.as_deref(), Some(collection.categories[0].id.as_str()));
    }

    #[test]
    fn invalid_arguments_surface_as_errors() {
        let dir = TempDir::new().unwrap();
        let mut context = script_context(dir.path());

        let err = process_line(&mut context, "shortcut add OnlyName").unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments(_)));
        let err = process_line(&mut context, "shortcut remove ghost").unwrap_err();
        assert!(matches!(err, CommandError::Core(CoreError::ShortcutNotFound(_))));
    }
}
