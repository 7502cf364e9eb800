//! Foreground reminder session for a terminal.
//!
//! # Responsibility
//! - Present reminders on stdout (banner, card, bell).
//! - Feed `c|s|d <id>` lines from stdin into the session's action channel.
//!
//! # Invariants
//! - The scheduler stops on `q`, end of input, or Ctrl-C.

use crate::cli::{resolve_id, Context};
use color_eyre::eyre::{eyre, Result};
use log::warn;
use std::io::Write;
use std::sync::Arc;
use taskpulse_core::scheduler::dispatcher::StaticPermission;
use taskpulse_core::{
    run_scheduler, Channel, Notification, NotificationAction, NotificationDispatcher,
    PresentError, Presenter, SchedulerSession, TaskId,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Renders every channel on the terminal.
struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn present(&self, notification: &Notification, channel: Channel) -> Result<(), PresentError> {
        let mut out = std::io::stdout().lock();
        let written = match channel {
            Channel::Native => writeln!(
                out,
                "🔔 {} ({})",
                notification.title, notification.scheduled_time
            ),
            Channel::Modal => writeln!(
                out,
                "┌ Task reminder\n│ {}\n│ {}\n└ c {id} complete · s {id} snooze {}m · d {id} dismiss",
                notification.title,
                notification.body,
                notification.snooze_minutes,
                id = notification.task_id
            ),
            Channel::Cue => write!(out, "\x07"),
        };
        written
            .and_then(|()| out.flush())
            .map_err(|err| PresentError::new(err.to_string()))
    }

    fn close(&self, task_id: TaskId, channel: Channel) -> Result<(), PresentError> {
        if channel == Channel::Modal {
            println!("  (reminder for {task_id} closed)");
        }
        Ok(())
    }
}

/// Parsed stdin command.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Action(char, &'a str),
    Quit,
    Help,
}

fn parse_input(line: &str) -> Option<Input<'_>> {
    let line = line.trim();
    match line {
        "" => None,
        "q" | "quit" => Some(Input::Quit),
        "h" | "help" | "?" => Some(Input::Help),
        _ => {
            let (verb, id) = line.split_once(char::is_whitespace)?;
            let verb = match verb {
                "c" | "complete" => 'c',
                "s" | "snooze" => 's',
                "d" | "dismiss" => 'd',
                _ => return Some(Input::Help),
            };
            Some(Input::Action(verb, id.trim()))
        }
    }
}

fn to_action(verb: char, task_id: TaskId) -> NotificationAction {
    match verb {
        'c' => NotificationAction::Complete { task_id },
        's' => NotificationAction::Snooze {
            task_id,
            minutes: None,
        },
        _ => NotificationAction::Dismiss { task_id },
    }
}

const HELP: &str = "commands: c <id> complete · s <id> snooze · d <id> dismiss · q quit";

pub async fn run_watch(ctx: Context) -> Result<()> {
    let presenter: Arc<dyn Presenter> = Arc::new(TerminalPresenter);
    let notifications = ctx.config.notifications;
    let mut dispatcher = NotificationDispatcher::new(
        Arc::new(StaticPermission(notifications.native)),
        ctx.settings.snooze_minutes,
        ctx.settings.modal_timeout,
    );
    for (channel, enabled) in [
        (Channel::Native, notifications.native),
        (Channel::Modal, notifications.modal),
        (Channel::Cue, notifications.cue),
    ] {
        if enabled {
            dispatcher = dispatcher.with_presenter(channel, presenter.clone());
        }
    }

    let session = Arc::new(SchedulerSession::new(
        ctx.store.clone(),
        ctx.clock.clone(),
        dispatcher,
        &ctx.settings,
    ));
    let (tx, rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let scheduler = tokio::spawn(run_scheduler(
        session,
        Some(rx),
        ctx.settings.poll_interval,
        cancel.clone(),
    ));

    println!("Watching {} task(s). {HELP}", ctx.service.list_tasks()?.len());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    None => {}
                    Some(Input::Quit) => break,
                    Some(Input::Help) => println!("{HELP}"),
                    Some(Input::Action(verb, raw_id)) => {
                        match resolve_id(&ctx.store.snapshot()?, raw_id) {
                            Ok(task_id) => {
                                tx.send(to_action(verb, task_id))
                                    .await
                                    .map_err(|_| eyre!("scheduler stopped"))?;
                            }
                            Err(err) => println!("{err}"),
                        }
                    }
                }
            }
        }
    }

    cancel.cancel();
    if let Err(err) = scheduler.await {
        warn!("event=scheduler_stop module=cli status=error error={err}");
    }
    Ok(())
}
