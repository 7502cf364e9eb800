//! Command-line surface and one-shot command handlers.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, Result};
use std::sync::Arc;
use taskpulse_core::model::task::parse_date;
use taskpulse_core::{
    compute_stats, open_repository, ActionHandler, ActionOutcome, Clock, Config, Mood, NewTask,
    NotificationAction, Priority, Profile, SchedulerSettings, SystemClock, Task, TaskId,
    TaskPatch, TaskService, TaskStore, TimeOfDay,
};

#[derive(Parser)]
#[command(name = "taskpulse")]
#[command(about = "Daily tasks with time-of-day reminders")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add {
        title: String,
        /// Time of day (HH:MM)
        #[arg(short, long)]
        time: String,
        /// low | medium | high
        #[arg(short, long)]
        priority: Option<String>,
        /// excited | neutral | dreading | challenging | routine
        #[arg(short, long)]
        mood: Option<String>,
        /// Date anchor (YYYY-MM-DD); defaults to every day
        #[arg(short, long)]
        deadline: Option<String>,
    },
    /// List active tasks
    List,
    /// Show one task
    Show { id: String },
    /// Edit a task; re-timing re-arms its reminder
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        time: Option<String>,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long)]
        mood: Option<String>,
        #[arg(short, long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        #[arg(long)]
        clear_deadline: bool,
    },
    /// Flip a task between pending and completed
    Toggle { id: String },
    /// Delete a task
    Delete { id: String },
    /// Complete a task and move it to history
    Complete { id: String },
    /// Push a task's reminder forward
    Snooze {
        id: String,
        /// Defaults to scheduler.snooze_minutes
        #[arg(short, long)]
        minutes: Option<u32>,
    },
    /// Silence a task's reminder without completing it
    Dismiss { id: String },
    /// List completed tasks moved out of the active list
    History,
    /// Completion rate and hourly load
    Stats,
    /// Run reminders in the foreground and answer them from stdin
    Watch,
    /// Run the HTTP API with the reminder scheduler
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Loaded config plus the store every command works on.
pub struct Context {
    pub config: Config,
    pub settings: SchedulerSettings,
    pub store: Arc<TaskStore>,
    pub clock: Arc<dyn Clock>,
    pub service: TaskService,
}

impl Context {
    pub fn open(config: Config, profile: Profile) -> Result<Self> {
        let database_path = config.database_path(profile)?;
        let repo = open_repository(config.storage.backend, &database_path)?;
        let store = Arc::new(TaskStore::new(repo));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Ok(Self {
            settings: config.scheduler.to_settings(),
            service: TaskService::new(store.clone(), clock.clone()),
            config,
            store,
            clock,
        })
    }

    /// Resolves a full id or a unique id prefix among active tasks.
    pub fn resolve_id(&self, raw: &str) -> Result<TaskId> {
        resolve_id(&self.service.list_tasks()?, raw)
    }
}

pub fn resolve_id(tasks: &[Task], raw: &str) -> Result<TaskId> {
    let needle = raw.trim().to_ascii_lowercase();
    if needle.is_empty() {
        bail!("task id cannot be empty");
    }
    let matches: Vec<TaskId> = tasks
        .iter()
        .map(|task| task.id)
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(eyre!("no active task matches `{raw}`")),
        _ => Err(eyre!("`{raw}` matches {} tasks; use a longer prefix", matches.len())),
    }
}

pub fn handle_add(
    ctx: &Context,
    title: String,
    time: &str,
    priority: Option<&str>,
    mood: Option<&str>,
    deadline: Option<&str>,
) -> Result<()> {
    let mut input = NewTask::new(title, TimeOfDay::parse(time)?);
    if let Some(priority) = priority {
        input.priority = parse_priority(priority)?;
    }
    input.mood = mood.map(parse_mood).transpose()?;
    input.deadline = deadline.map(parse_date).transpose()?;

    let task = ctx.service.create_task(input)?;
    println!("Task created (ID: {})", task.id);
    Ok(())
}

pub fn handle_list(ctx: &Context) -> Result<()> {
    let tasks = ctx.service.list_tasks()?;
    if tasks.is_empty() {
        println!("No tasks.");
    }
    for task in &tasks {
        println!("{}", task_line(task));
    }
    Ok(())
}

pub fn handle_show(ctx: &Context, id: &str) -> Result<()> {
    let task = ctx.service.get_task(ctx.resolve_id(id)?)?;
    println!("{}", task_detail(&task));
    Ok(())
}

pub struct EditArgs {
    pub title: Option<String>,
    pub time: Option<String>,
    pub priority: Option<String>,
    pub mood: Option<String>,
    pub deadline: Option<String>,
    pub clear_deadline: bool,
}

pub fn handle_edit(ctx: &Context, id: &str, args: EditArgs) -> Result<()> {
    let id = ctx.resolve_id(id)?;
    let patch = TaskPatch {
        title: args.title,
        scheduled_time: args.time.as_deref().map(TimeOfDay::parse).transpose()?,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        mood: args.mood.as_deref().map(parse_mood).transpose()?,
        deadline: args.deadline.as_deref().map(parse_date).transpose()?,
        clear_deadline: args.clear_deadline,
        status: None,
    };
    let task = ctx.service.update_task(id, patch)?;
    println!("{}", task_line(&task));
    Ok(())
}

pub fn handle_toggle(ctx: &Context, id: &str) -> Result<()> {
    let task = ctx.service.toggle_status(ctx.resolve_id(id)?)?;
    println!("{}", task_line(&task));
    Ok(())
}

pub fn handle_delete(ctx: &Context, id: &str) -> Result<()> {
    let id = ctx.resolve_id(id)?;
    ctx.service.delete_task(id)?;
    println!("Task deleted (ID: {id})");
    Ok(())
}

/// Applies a reminder action outside a running session.
///
/// A completed task is relocated right away; the removal delay only exists
/// to let an open notification show its confirmation.
pub fn handle_action(ctx: &Context, action: NotificationAction) -> Result<()> {
    let handler = ActionHandler::new(ctx.settings.snooze_minutes, ctx.settings.removal_delay);
    let outcome = handler.handle(&ctx.store, action, ctx.clock.now())?;
    if let ActionOutcome::Completed { task, .. } = &outcome {
        ctx.store.relocate_to_history(&[task.id])?;
    }
    println!("{}", describe_outcome(&outcome));
    Ok(())
}

pub fn handle_history(ctx: &Context) -> Result<()> {
    let history = ctx.service.list_history()?;
    if history.is_empty() {
        println!("History is empty.");
    }
    for task in &history {
        let completed = task
            .completed_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{completed}  {}", task_line(task));
    }
    Ok(())
}

pub fn handle_stats(ctx: &Context) -> Result<()> {
    let stats = compute_stats(&ctx.service.list_tasks()?, &ctx.service.list_history()?);
    println!(
        "Total: {}  Completed: {}  Pending: {}  Productivity: {}%",
        stats.total, stats.completed, stats.pending, stats.productivity_percent
    );
    let peak = stats.heatmap.iter().copied().max().unwrap_or(0).max(1);
    for (hour, count) in stats.heatmap.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let bar = "#".repeat(((*count * 20) / peak).max(1) as usize);
        println!("{hour:02}:00 {bar} {count}");
    }
    Ok(())
}

pub fn task_line(task: &Task) -> String {
    let mark = if task.is_pending() { "[ ]" } else { "[x]" };
    let deadline = task
        .deadline
        .map(|date| format!(" {date}"))
        .unwrap_or_default();
    format!(
        "{mark} {}  {}{deadline}  {:<6}  {}",
        task.id,
        task.scheduled_time,
        task.priority.as_str(),
        task.title
    )
}

fn task_detail(task: &Task) -> String {
    let mut lines = vec![
        format!("ID:        {}", task.id),
        format!("Title:     {}", task.title),
        format!("Time:      {}", task.scheduled_time),
        format!("Priority:  {}", task.priority.as_str()),
        format!("Status:    {}", task.status.as_str()),
        format!("Notified:  {}", if task.notified { "yes" } else { "no" }),
    ];
    if let Some(mood) = task.mood {
        lines.push(format!("Mood:      {} {}", mood.emoji(), mood.as_str()));
    }
    if let Some(deadline) = task.deadline {
        lines.push(format!("Deadline:  {deadline}"));
    }
    if let Some(completed_at) = task.completed_at {
        lines.push(format!("Completed: {}", completed_at.format("%Y-%m-%d %H:%M")));
    }
    lines.join("\n")
}

pub fn describe_outcome(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Completed { task, .. } => format!("Completed {}", task.id),
        ActionOutcome::Snoozed { task } => {
            format!("Snoozed {} until {}", task.id, task.scheduled_time)
        }
        ActionOutcome::Dismissed { task_id } => format!("Dismissed reminder for {task_id}"),
        ActionOutcome::Ignored { task_id, reason } => format!("Nothing to do for {task_id} ({reason})"),
        ActionOutcome::TaskMissing { task_id } => format!("Task {task_id} no longer exists"),
    }
}

fn parse_priority(value: &str) -> Result<Priority> {
    Priority::parse(value).ok_or_else(|| eyre!("invalid priority `{value}`; expected low|medium|high"))
}

fn parse_mood(value: &str) -> Result<Mood> {
    Mood::parse(value).ok_or_else(|| {
        eyre!("invalid mood `{value}`; expected excited|neutral|dreading|challenging|routine")
    })
}
