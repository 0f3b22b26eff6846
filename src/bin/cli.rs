//! PeakStreak CLI
//!
//! Command-line client for a PeakStreak server:
//! - Sign up, log in and manage the account
//! - Create, edit and log habits
//! - Follow people, browse the leaderboard and explore feed
//! - Render habit heatmaps to SVG files

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use peakstreak::calendar::{render_habit_heatmap, today_utc, years_to_render};
use peakstreak::client::{ApiClient, SessionStore};
use peakstreak::config::generate_default_config;
use peakstreak::domain::{HabitWithLogs, PublicUser, Session, DATE_FORMAT};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "peakstreak")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Track habits and see your streaks as calendar heatmaps")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8080", global = true)]
    pub api_url: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Session file (default: <config_dir>/peakstreak/session.json)
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Signup {
        username: String,
        email: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log in with a username or email
    Login {
        identifier: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Show a profile and its habits (default: your own)
    Profile { username: Option<String> },

    /// Create a habit
    Add {
        name: String,
        /// Colour hue, 0-360
        #[arg(long, default_value = "120")]
        hue: i32,
        /// Track a number per day instead of done/not done
        #[arg(long)]
        graded: bool,
    },

    /// Change a habit's name or colour
    Edit {
        habit_id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        hue: Option<i32>,
        /// Switch between done/not done (true) and graded (false)
        #[arg(long)]
        boolean: Option<bool>,
    },

    /// Delete a habit and all its logs
    Delete {
        habit_id: Uuid,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Log a day for a habit
    Log {
        habit_id: Uuid,
        /// Date as YYYY-MM-DD (default: today, UTC)
        #[arg(short, long)]
        date: Option<String>,
        /// Value for the day; 0 clears it
        #[arg(short, long, default_value = "1")]
        value: i32,
    },

    /// Follow a user
    Follow { username: String },

    /// Stop following a user
    Unfollow { username: String },

    /// List a user's followers
    Followers { username: String },

    /// List who a user follows
    Following { username: String },

    /// Search users by name
    Search { query: String },

    /// Users ranked by total logged days
    Leaderboard,

    /// Recently active habits
    Explore,

    /// Upload a JPEG or PNG avatar
    Avatar { path: PathBuf },

    /// Delete your account and everything in it
    DeleteAccount {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Write SVG heatmaps for a habit
    Heatmap {
        username: String,
        /// Habit id or name
        habit: String,
        /// Year to render (default: every year with logs)
        #[arg(short, long)]
        year: Option<i32>,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Print a default server config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peakstreak=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let store = match &cli.session {
        Some(path) => SessionStore::new(path),
        None => SessionStore::default_location()
            .context("no config directory; pass --session <path>")?,
    };
    let session = store.load()?;

    let mut client = ApiClient::new(&cli.api_url)?;
    client.set_token(session.as_ref().map(|s| s.token.clone()));

    let format = cli.format;

    match cli.command {
        Commands::Signup {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let user = client.signup(&username, &email, &password).await?;
            let session = client.login(&user.username, &password).await?;
            store.save(&session)?;
            print_or(format, &user, || println!("Signed up as {}", user.username))?;
        }

        Commands::Login {
            identifier,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let session = client.login(&identifier, &password).await?;
            store.save(&session)?;
            print_or(format, &session.user, || {
                println!("Logged in as {}", session.user.username)
            })?;
        }

        Commands::Logout => {
            store.clear()?;
            println!("Logged out");
        }

        Commands::Whoami => {
            let user = client.me().await?;
            print_or(format, &user, || {
                println!("{} <{}>", user.username, user.email);
                if let Some(avatar) = &user.avatar_url {
                    println!("Avatar: {}", avatar);
                }
                println!("Member since {}", user.created_at.format(DATE_FORMAT));
            })?;
        }

        Commands::Profile { username } => {
            let username = match username {
                Some(name) => name,
                None => require_session(&session)?.user.username.clone(),
            };
            let profile = client.profile(&username).await?;
            print_or(format, &profile, || {
                println!(
                    "{}  ({} followers, {} following){}",
                    profile.user.username,
                    profile.followers_count,
                    profile.following_count,
                    if profile.is_following { "  [following]" } else { "" }
                );
                println!();
                print_habits(&profile.habits);
            })?;
        }

        Commands::Add { name, hue, graded } => {
            let habit = client.create_habit(&name, hue, !graded).await?;
            print_or(format, &habit, || {
                println!("Created {} ({})", habit.name, habit.id)
            })?;
        }

        Commands::Edit {
            habit_id,
            name,
            hue,
            boolean,
        } => {
            let me = require_session(&session)?;
            let profile = client.profile(&me.user.username).await?;
            let Some(current) = profile.habits.iter().find(|h| h.habit.id == habit_id) else {
                bail!("You have no habit with id {}", habit_id);
            };

            let habit = client
                .update_habit(
                    habit_id,
                    name.as_deref().unwrap_or(&current.habit.name),
                    hue.unwrap_or(current.habit.color_hue),
                    boolean,
                )
                .await?;
            print_or(format, &habit, || println!("Updated {}", habit.name))?;
        }

        Commands::Delete { habit_id, yes } => {
            if !yes && !confirm(&format!("Delete habit {habit_id} and all its logs?"))? {
                println!("Cancelled");
                return Ok(());
            }
            client.delete_habit(habit_id).await?;
            println!("Deleted habit {}", habit_id);
        }

        Commands::Log {
            habit_id,
            date,
            value,
        } => {
            let date = match date {
                Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                    .with_context(|| format!("invalid date {raw:?}, use YYYY-MM-DD"))?,
                None => today_utc(),
            };
            let log = client.log_habit(habit_id, date, value).await?;

            // The profile read may predate the upsert, so fold the new log in
            let habit = match format {
                OutputFormat::Table => {
                    let username = &require_session(&session)?.user.username;
                    let mut habit = client
                        .profile(username)
                        .await?
                        .habits
                        .into_iter()
                        .find(|h| h.habit.id == habit_id);
                    if let Some(habit) = habit.as_mut() {
                        habit.merge_log(log.clone());
                    }
                    habit
                }
                OutputFormat::Json => None,
            };

            print_or(format, &log, || {
                if log.is_completed() {
                    println!("Logged {} = {}", log.date, log.value);
                } else {
                    println!("Cleared {}", log.date);
                }
                if let Some(habit) = &habit {
                    println!("Current streak: {} day(s)", current_streak(habit, today_utc()));
                }
            })?;
        }

        Commands::Follow { username } => {
            client.follow(&username).await?;
            println!("Following {}", username);
        }

        Commands::Unfollow { username } => {
            client.unfollow(&username).await?;
            println!("Unfollowed {}", username);
        }

        Commands::Followers { username } => {
            let users = client.followers(&username).await?;
            print_or(format, &users, || print_users(&users))?;
        }

        Commands::Following { username } => {
            let users = client.following(&username).await?;
            print_or(format, &users, || print_users(&users))?;
        }

        Commands::Search { query } => {
            let users = client.search_users(&query).await?;
            print_or(format, &users, || print_users(&users))?;
        }

        Commands::Leaderboard => {
            let entries = client.leaderboard().await?;
            print_or(format, &entries, || {
                println!("{:<5} {:<20} {:>6} {:>7}", "Rank", "User", "Days", "Habits");
                println!("{}", "-".repeat(41));
                for (rank, entry) in entries.iter().enumerate() {
                    println!(
                        "{:<5} {:<20} {:>6} {:>7}",
                        rank + 1,
                        entry.user.username,
                        entry.total_logged_days,
                        entry.habits.len()
                    );
                }
            })?;
        }

        Commands::Explore => {
            let entries = client.explore().await?;
            print_or(format, &entries, || {
                println!("{:<20} {:<30} {}", "User", "Habit", "Last logged");
                println!("{}", "-".repeat(63));
                for entry in &entries {
                    let last = entry
                        .habit
                        .logs
                        .last()
                        .map(|log| log.date.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<20} {:<30} {}",
                        entry.user.username, entry.habit.habit.name, last
                    );
                }
            })?;
        }

        Commands::Avatar { path } => {
            let data = std::fs::read(&path).with_context(|| format!("reading {:?}", path))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "avatar".to_string());
            let url = client.upload_avatar(&file_name, data).await?;
            println!("Avatar uploaded: {}", url);
        }

        Commands::DeleteAccount { yes } => {
            let me = require_session(&session)?;
            let prompt = format!(
                "Permanently delete {} with all habits, logs and follows?",
                me.user.username
            );
            if !yes && !confirm(&prompt)? {
                println!("Cancelled");
                return Ok(());
            }
            client.delete_account().await?;
            store.clear()?;
            println!("Account deleted");
        }

        Commands::Heatmap {
            username,
            habit,
            year,
            output,
        } => {
            let profile = client.profile(&username).await?;
            let Some(habit) = find_habit(&profile.habits, &habit) else {
                bail!("{} has no habit {:?}", username, habit);
            };

            let today = today_utc();
            let years = match year {
                Some(year) => vec![year],
                None => years_to_render(&habit.logs, today),
            };

            std::fs::create_dir_all(&output)?;
            for year in years {
                let svg = render_habit_heatmap(habit, year, today);
                let path = output.join(format!("{}-{}.svg", slug(&habit.habit.name), year));
                std::fs::write(&path, svg).with_context(|| format!("writing {:?}", path))?;
                println!("Wrote {}", path.display());
            }
        }

        Commands::Config { output } => {
            let config = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, config)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", config),
            }
        }
    }

    Ok(())
}

fn require_session(session: &Option<Session>) -> anyhow::Result<&Session> {
    session
        .as_ref()
        .context("not logged in; run `peakstreak login <username>` first")
}

/// JSON output when asked for, the table printer otherwise
fn print_or<T: Serialize>(
    format: OutputFormat,
    value: &T,
    table: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Table => table(),
    }
    Ok(())
}

fn print_users(users: &[PublicUser]) {
    if users.is_empty() {
        println!("No users.");
        return;
    }
    for user in users {
        println!("{}", user.username);
    }
}

fn print_habits(habits: &[HabitWithLogs]) {
    if habits.is_empty() {
        println!("No habits yet.");
        return;
    }
    println!("{:<38} {:<30} {:>4} {:>6}", "ID", "Habit", "Hue", "Days");
    println!("{}", "-".repeat(81));
    for habit in habits {
        println!(
            "{:<38} {:<30} {:>4} {:>6}",
            habit.habit.id,
            habit.habit.name,
            habit.habit.color_hue,
            habit.logs.len()
        );
    }
}

/// Consecutive logged days ending today, or yesterday while today is open
fn current_streak(habit: &HabitWithLogs, today: NaiveDate) -> usize {
    let start = if habit.is_logged_on(today) {
        Some(today)
    } else {
        today.pred_opt()
    };
    std::iter::successors(start, |day| day.pred_opt())
        .take_while(|day| habit.is_logged_on(*day))
        .count()
}

/// Match by id first, then by case-insensitive name
fn find_habit<'a>(habits: &'a [HabitWithLogs], key: &str) -> Option<&'a HabitWithLogs> {
    if let Ok(id) = Uuid::parse_str(key) {
        return habits.iter().find(|h| h.habit.id == id);
    }
    habits
        .iter()
        .find(|h| h.habit.name.eq_ignore_ascii_case(key.trim()))
}

fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "habit".to_string()
    } else {
        slug.to_string()
    }
}

fn read_line(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => read_line("Password: "),
    }
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    let answer = read_line(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use peakstreak::domain::{Habit, HabitLog};

    fn habit(name: &str) -> HabitWithLogs {
        HabitWithLogs::new(
            Habit {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                name: name.to_string(),
                color_hue: 120,
                is_boolean: true,
                created_at: Utc::now(),
            },
            Vec::new(),
        )
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Read 20 Pages!"), "read-20-pages");
        assert_eq!(slug("***"), "habit");
    }

    #[test]
    fn test_find_habit_by_id_or_name() {
        let habits = vec![habit("Read"), habit("Run")];
        let id = habits[1].habit.id.to_string();

        assert_eq!(find_habit(&habits, &id).unwrap().habit.name, "Run");
        assert_eq!(find_habit(&habits, " read ").unwrap().habit.name, "Read");
        assert!(find_habit(&habits, "Swim").is_none());
        assert!(find_habit(&habits, &Uuid::new_v4().to_string()).is_none());
    }

    fn log_on(habit: &HabitWithLogs, date: NaiveDate, value: i32) -> HabitLog {
        HabitLog {
            id: Uuid::new_v4(),
            habit_id: habit.habit.id,
            date,
            value,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_current_streak() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let mut read = habit("Read");
        for d in [1, 3, 4, 5] {
            read.merge_log(log_on(&read, day(d), 1));
        }

        assert_eq!(current_streak(&read, day(5)), 3);
        // Today not logged yet keeps yesterday's run alive
        assert_eq!(current_streak(&read, day(6)), 3);
        assert_eq!(current_streak(&read, day(7)), 0);

        read.merge_log(log_on(&read, day(4), 0));
        assert_eq!(current_streak(&read, day(5)), 1);
    }

    #[test]
    fn test_cli_parses() {
        let id = Uuid::nil().to_string();
        let cli = Cli::try_parse_from(["peakstreak", "--format", "json", "delete", &id, "--yes"])
            .unwrap();
        assert!(cli.format == OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Delete { yes: true, .. }));

        let cli = Cli::try_parse_from(["peakstreak", "add", "Pushups", "--hue", "10", "--graded"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Add {
                hue: 10,
                graded: true,
                ..
            }
        ));
    }
}
