//! `taskpulse` binary entry point.

mod cli;
mod watch;

use clap::Parser;
use cli::{Cli, Commands, Context, EditArgs};
use color_eyre::Result;
use std::path::PathBuf;
use taskpulse_core::{init_logging, init_stderr_logging, Config, NotificationAction, Profile};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };
    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_or_create(&PathBuf::from(path))?,
        None => Config::load_with_profile(profile)?,
    };

    // Long-running modes log to files; one-shot commands keep stdout clean.
    match &cli.command {
        Commands::Serve { .. } | Commands::Watch => {
            let log_dir = config.log_dir(profile)?;
            init_logging(config.log_level(), &log_dir.to_string_lossy())
                .map_err(|err| color_eyre::eyre::eyre!(err))?;
        }
        _ => init_stderr_logging("warn").map_err(|err| color_eyre::eyre::eyre!(err))?,
    }

    if let Commands::Serve { host, port } = &cli.command {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_signal.cancel();
            }
        });
        println!(
            "Serving on http://{}:{}",
            config.server.host, config.server.port
        );
        taskpulse_server::run_server(&config, profile, cancel).await?;
        return Ok(());
    }

    let ctx = Context::open(config, profile)?;
    match cli.command {
        Commands::Add {
            title,
            time,
            priority,
            mood,
            deadline,
        } => cli::handle_add(
            &ctx,
            title,
            &time,
            priority.as_deref(),
            mood.as_deref(),
            deadline.as_deref(),
        )?,
        Commands::List => cli::handle_list(&ctx)?,
        Commands::Show { id } => cli::handle_show(&ctx, &id)?,
        Commands::Edit {
            id,
            title,
            time,
            priority,
            mood,
            deadline,
            clear_deadline,
        } => cli::handle_edit(
            &ctx,
            &id,
            EditArgs {
                title,
                time,
                priority,
                mood,
                deadline,
                clear_deadline,
            },
        )?,
        Commands::Toggle { id } => cli::handle_toggle(&ctx, &id)?,
        Commands::Delete { id } => cli::handle_delete(&ctx, &id)?,
        Commands::Complete { id } => {
            let task_id = ctx.resolve_id(&id)?;
            cli::handle_action(&ctx, NotificationAction::Complete { task_id })?
        }
        Commands::Snooze { id, minutes } => {
            let task_id = ctx.resolve_id(&id)?;
            cli::handle_action(&ctx, NotificationAction::Snooze { task_id, minutes })?
        }
        Commands::Dismiss { id } => {
            let task_id = ctx.resolve_id(&id)?;
            cli::handle_action(&ctx, NotificationAction::Dismiss { task_id })?
        }
        Commands::History => cli::handle_history(&ctx)?,
        Commands::Stats => cli::handle_stats(&ctx)?,
        Commands::Watch => watch::run_watch(ctx).await?,
        Commands::Serve { .. } => {}
    }

    Ok(())
}
