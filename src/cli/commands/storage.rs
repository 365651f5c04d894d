use quicklink_remote::ConnectionStatus;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "storage",
        "Inspect or change where shortcuts are stored",
        "storage [status|check|local|sync|reconnect]",
        cmd_storage,
    )]
}

fn cmd_storage(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = args.first().map(|arg| arg.to_lowercase());
    match action.as_deref().unwrap_or("status") {
        "status" => handle_status(context),
        "check" => handle_check(context),
        "local" => handle_local(context),
        "sync" => handle_sync(context),
        "reconnect" => handle_reconnect(context),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown storage subcommand `{}`",
            other
        ))),
    }
}

fn handle_status(context: &mut ShellContext) -> CommandResult {
    let storage = &context.storage;
    output::section("Storage");
    output::line(format!("  Configured mode: {}", storage.requested()));
    output::line(format!("  Active backend:  {}", storage.label()));
    output::line(format!(
        "  Local data file: {}",
        storage.local().backend().data_path().display()
    ));
    if let Some(hybrid) = storage.hybrid() {
        let info = hybrid.info();
        output::line(format!("  Cloud backend:   {}", info.cloud_backend));
        output::line(format!("  Connected:       {}", yes_no(info.connected)));
        output::line(format!("  Forced local:    {}", yes_no(info.forced_local)));
        output::line(format!(
            "  Last checked:    {}",
            info.last_checked.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if let Some(latency) = info.latency_ms {
            output::line(format!("  Latency:         {} ms", latency));
        }
        if let Some(error) = info.last_error {
            output::line(format!("  Last error:      {}", error));
        }
        output::line(format!(
            "  Monitor:         {}",
            if storage.is_monitoring() {
                format!("every {} s", context.config.monitor_interval_secs)
            } else {
                "off".to_string()
            }
        ));
    }
    if storage.requested().is_cloud() && !context.config.is_cloud_configured(storage.requested()) {
        io::print_warning(format!(
            "{} credentials are missing; see `config show`.",
            storage.requested()
        ));
    }
    Ok(())
}

fn handle_check(context: &mut ShellContext) -> CommandResult {
    let Some(status) = context.storage.check() else {
        io::print_info("Local storage is active; there is no cloud connection to check.");
        return Ok(());
    };
    report_status(&status);
    context.announce_storage_updates();
    Ok(())
}

fn handle_local(context: &mut ShellContext) -> CommandResult {
    if !context.storage.use_local() {
        io::print_info("Already using local storage.");
        return Ok(());
    }
    context.refresh_manager();
    context.announce_storage_updates();
    io::print_success("Switched to local storage; use `storage reconnect` to return to the cloud.");
    Ok(())
}

fn handle_sync(context: &mut ShellContext) -> CommandResult {
    match context.storage.sync_to_cloud()? {
        None => Err(CommandError::Message(
            "Sync needs a cloud storage mode; use `config set storage_mode <mode>`.".into(),
        )),
        Some(report) if report.is_empty() => {
            io::print_info("Cloud already has every local record.");
            Ok(())
        }
        Some(report) => {
            io::print_success(format!(
                "Synced {} categories and {} shortcuts to the cloud.",
                report.categories, report.shortcuts
            ));
            Ok(())
        }
    }
}

fn handle_reconnect(context: &mut ShellContext) -> CommandResult {
    if !context.storage.requested().is_cloud() {
        io::print_info("Local storage is configured; there is no cloud to reconnect to.");
        return Ok(());
    }
    match context.storage.reconnect() {
        // a direct cloud mode dropped to local earlier in the session
        None => context.reload_storage(),
        Some(true) => {
            context.refresh_manager();
            context.announce_storage_updates();
            io::print_success("Cloud storage reachable.");
            Ok(())
        }
        Some(false) => {
            context.announce_storage_updates();
            Err(CommandError::Message(
                "Cloud storage still unreachable; staying on local storage.".into(),
            ))
        }
    }
}

fn report_status(status: &ConnectionStatus) {
    if status.connected {
        io::print_success(format!(
            "Cloud reachable{}.",
            status
                .latency_ms
                .map(|ms| format!(" ({} ms)", ms))
                .unwrap_or_default()
        ));
    } else {
        io::print_warning(format!(
            "Cloud unreachable: {}",
            status.error.as_deref().unwrap_or("no response")
        ));
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
