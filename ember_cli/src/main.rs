use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use ember_core::plan::{self as plan_engine, StageOutcome};
use ember_core::stats;
use ember_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Cigarette reduction tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    date: Option<String>,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's counters, goal and challenges (default)
    Today,

    /// Count a cigarette
    Add {
        /// morning, afternoon or evening
        period: String,
    },

    /// Take back a cigarette
    Remove {
        /// morning, afternoon or evening
        period: String,
    },

    /// Attach a reason tag to today
    Tag { label: String },

    /// Attach a coping strategy to today
    Strategy { label: String },

    /// Log a workout for today
    Workout,

    /// Gradual reduction plan
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Challenges
    Challenge {
        #[command(subcommand)]
        action: ChallengeAction,
    },

    /// Weekly, monthly and all-time statistics
    Stats {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the day history as CSV
    Export { path: PathBuf },

    /// Delete everything recorded for a date
    DeleteDay { date: String },
}

#[derive(Subcommand)]
enum PlanAction {
    /// Start a new plan, replacing any existing one
    Start {
        /// Current cigarettes per day (1-50)
        #[arg(long)]
        starting: Option<u32>,

        /// slow, moderate or fast
        #[arg(long)]
        pace: Option<String>,

        /// health, money or family
        #[arg(long)]
        motivation: Option<String>,
    },

    /// Show the plan and today's goal
    Show,

    /// Close the active stage and move to the next one
    Advance {
        /// Mark the stage as failed instead of completed
        #[arg(long)]
        failed: bool,
    },
}

#[derive(Subcommand)]
enum ChallengeAction {
    /// List the catalog
    List,
    /// Opt into a challenge
    Subscribe { id: String },
    /// Drop a challenge
    Unsubscribe { id: String },
    /// Show subscribed challenges
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        ember_core::logging::init_with_level("debug");
    } else {
        ember_core::logging::init_with_level("warn");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }
    let today = match cli.date.as_deref() {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };
    // Back-dated entries must not move the last-cigarette time
    let now = cli.date.is_none().then(Utc::now);

    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Other("Invalid challenge catalog".into()));
    }

    tracing::debug!("Using data directory {:?}, today is {}", config.data.data_dir, today);
    let storage = Storage::open(config.store_dir());
    let mut tracker = Tracker::new(storage, today);

    match cli.command {
        None | Some(Commands::Today) => cmd_today(&tracker),
        Some(Commands::Add { period }) => {
            let period: Period = period.parse()?;
            let (day, changed) = tracker.add_cigarette(period, now)?;
            println!("✓ Added {} cigarette (today: {})", period, day.total());
            print_changes(&changed);
            print_feedback(&tracker);
            Ok(())
        }
        Some(Commands::Remove { period }) => {
            let period: Period = period.parse()?;
            let (day, changed) = tracker.remove_cigarette(period)?;
            println!("✓ Removed {} cigarette (today: {})", period, day.total());
            print_changes(&changed);
            print_feedback(&tracker);
            Ok(())
        }
        Some(Commands::Tag { label }) => {
            if tracker.add_tag(&label)? {
                println!("✓ Tagged today with '{}'", label.trim());
            } else {
                println!("Tag '{}' already recorded today", label.trim());
            }
            Ok(())
        }
        Some(Commands::Strategy { label }) => {
            if tracker.add_strategy(&label)? {
                println!("✓ Recorded strategy '{}'", label.trim());
            } else {
                println!("Strategy '{}' already recorded today", label.trim());
            }
            Ok(())
        }
        Some(Commands::Workout) => {
            if tracker.log_workout()? {
                println!("✓ Workout logged for {}", today);
            } else {
                println!("Workout already logged for {}", today);
            }
            Ok(())
        }
        Some(Commands::Plan { action }) => cmd_plan(&mut tracker, action, &config),
        Some(Commands::Challenge { action }) => cmd_challenge(&mut tracker, action),
        Some(Commands::Stats { json }) => cmd_stats(&tracker, json),
        Some(Commands::Export { path }) => {
            let history = tracker.storage().get_all_data();
            let count = export_history_csv(&history, &path)?;
            println!("✓ Exported {} days to {}", count, path.display());
            Ok(())
        }
        Some(Commands::DeleteDay { date }) => {
            let date = parse_date(&date)?;
            if tracker.storage_mut().delete_day(date)? {
                println!("✓ Deleted {}", date);
            } else {
                println!("Nothing recorded for {}", date);
            }
            Ok(())
        }
    }
}

fn cmd_today<S: KeyValueStore>(tracker: &Tracker<S>) -> Result<()> {
    let day = tracker.today_counters();

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", day.date);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Morning:   {}", day.morning);
    println!("  Afternoon: {}", day.afternoon);
    println!("  Evening:   {}", day.evening);
    println!("  Total:     {}", day.total());
    println!("  Level:     {:?}", stats::profile_level(day.total()));

    if !day.tags.is_empty() {
        println!("  Tags:      {}", day.tags.join(", "));
    }
    if !day.strategies.is_empty() {
        println!("  Strategies: {}", day.strategies.join(", "));
    }

    let last = tracker.storage().get_last_cigarette_time();
    if let Some(t) = stats::time_since(last, Utc::now()) {
        println!(
            "  Since last: {}d {:02}h {:02}m {:02}s",
            t.days, t.hours, t.minutes, t.seconds
        );
    }

    println!();
    print_feedback(tracker);

    for sub in tracker.storage().get_subscribed_challenges() {
        println!("  Challenge {}: {}", sub.id, sub.status);
    }
    println!();
    Ok(())
}

fn cmd_plan<S: KeyValueStore>(
    tracker: &mut Tracker<S>,
    action: PlanAction,
    config: &Config,
) -> Result<()> {
    let today = tracker.today();

    match action {
        PlanAction::Start {
            starting,
            pace,
            motivation,
        } => {
            let requested = starting.unwrap_or(config.plan.default_starting_cigarettes);
            let starting = plan_engine::clamp_starting_cigarettes(requested);
            if starting != requested {
                println!("Starting count clamped to {}", starting);
            }
            let pace = match pace {
                Some(p) => p.parse()?,
                None => config.plan.default_pace,
            };
            let motivation = match motivation {
                Some(m) => m.parse()?,
                None => config.plan.default_motivation,
            };

            let plan = generate_plan(starting, pace, motivation, today)?;
            tracker.storage_mut().save_plan(&plan)?;
            println!(
                "✓ Started {:?} plan: {} stages from {} cigarettes/day",
                pace,
                plan.stages.len(),
                starting
            );
            print_plan(&plan, today);
            Ok(())
        }
        PlanAction::Show => {
            let plan = tracker.storage().get_plan().ok_or(Error::NoActivePlan)?;
            print_plan(&plan, today);
            print_feedback(tracker);
            Ok(())
        }
        PlanAction::Advance { failed } => {
            let mut plan = tracker.storage().get_plan().ok_or(Error::NoActivePlan)?;
            let outcome = if failed {
                StageOutcome::Failed
            } else {
                StageOutcome::Completed
            };
            let next = plan_engine::advance_stage(&mut plan, outcome, today)?.cloned();
            tracker.storage_mut().save_plan(&plan)?;

            match next {
                Some(stage) => println!(
                    "✓ Stage {} active: max {} cigarettes/day for {} days",
                    stage.id, stage.to, stage.duration
                ),
                None => println!("✓ Plan finished"),
            }
            Ok(())
        }
    }
}

fn cmd_challenge<S: KeyValueStore>(
    tracker: &mut Tracker<S>,
    action: ChallengeAction,
) -> Result<()> {
    let today = tracker.today();

    match action {
        ChallengeAction::List => {
            let catalog = get_default_catalog();
            for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
                println!("{}:", difficulty);
                for def in catalog.by_difficulty(difficulty) {
                    println!("  {:<20} {} - {}", def.id, def.title, def.description);
                }
            }
            Ok(())
        }
        ChallengeAction::Subscribe { id } => {
            let entry = tracker.storage_mut().subscribe_to_challenge(&id, today)?;
            println!("✓ Subscribed to '{}'", entry.id);
            Ok(())
        }
        ChallengeAction::Unsubscribe { id } => {
            if tracker.storage_mut().unsubscribe_from_challenge(&id)? {
                println!("✓ Unsubscribed from '{}'", id);
            } else {
                println!("Not subscribed to '{}'", id);
            }
            Ok(())
        }
        ChallengeAction::Status => {
            let subs = tracker.storage().get_subscribed_challenges();
            if subs.is_empty() {
                println!("No challenges subscribed");
            }
            for sub in subs {
                println!("{} ({}): {}", sub.id, sub.subscribed_date, sub.status);
            }
            Ok(())
        }
    }
}

fn cmd_stats<S: KeyValueStore>(tracker: &Tracker<S>, json: bool) -> Result<()> {
    let history = tracker.storage().get_all_data();
    let report = stats::build_report(&history, tracker.today());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Week:  {} total, {:.1}/day", report.weekly_total, report.weekly_average);
    println!("Month: {} total, {:.1}/day", report.monthly_total, report.monthly_average);
    println!("All:   {} total, {:.1}/day", report.yearly_total, report.yearly_average);
    println!("Worst day: {}", report.max_day);

    for (period, total) in &report.period_totals {
        println!("  {:<10} {}", period, total);
    }

    let tags = stats::frequency_percentages(&report.tag_frequency);
    if !tags.is_empty() {
        println!("Tags:");
        for (label, pct) in tags {
            println!("  {:<16} {:.1}%", label, pct);
        }
    }

    let strategies = stats::frequency_percentages(&report.strategy_frequency);
    if !strategies.is_empty() {
        println!("Strategies:");
        for (label, pct) in strategies {
            println!("  {:<16} {:.1}%", label, pct);
        }
    }

    Ok(())
}

fn print_plan(plan: &ReductionPlan, today: NaiveDate) {
    println!();
    println!(
        "  Progress: {:.0}% ({} of {} stages)",
        plan_engine::progress_percent(plan),
        plan_engine::completed_stages(plan),
        plan.stages.len()
    );
    if let Some(left) = plan_engine::days_remaining(plan, today) {
        println!("  Days remaining in stage: {}", left);
    }
    for stage in &plan.stages {
        let marker = match stage.status {
            StageStatus::Completed => "✓",
            StageStatus::Failed => "✗",
            StageStatus::Active => "→",
            StageStatus::Pending => " ",
        };
        println!(
            "  {} Stage {:>2}: {} → {} ({} days)",
            marker, stage.id, stage.from, stage.to, stage.duration
        );
    }
    println!();
}

fn print_feedback<S: KeyValueStore>(tracker: &Tracker<S>) {
    let Some(feedback) = tracker.plan_feedback() else {
        return;
    };
    let total = tracker.today_counters().total();
    match feedback.status {
        DailyStatus::Success => println!("  ✓ Within today's goal ({}/{})", total, feedback.goal),
        DailyStatus::Warning => println!("  ⚠ Goal: {}, current: {}", feedback.goal, total),
    }
}

fn print_changes(changed: &[SubscribedChallenge]) {
    for sub in changed {
        println!("  Challenge '{}' {}", sub.id, sub.status);
    }
}
