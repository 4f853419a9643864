use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use pushhub::config::{AppConfig, HubConfig};

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Init(args)) => return RunOutcome::Exit(run_init(args)),
        Some(Command::HashPassword(args)) => return RunOutcome::Exit(run_hash_password(args)),
        None => {}
    }

    match resolve_hub_config(&cli) {
        Ok(hub) => RunOutcome::Serve(AppConfig {
            addr: cli.addr,
            data_dir: cli.data_dir,
            vapid_private_key: cli.vapid_private_key,
            vapid_public_key: cli.vapid_public_key,
            vapid_subject: cli.vapid_subject,
            admin_password_hash: cli.admin_password_hash,
            hub,
        }),
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pushhub",
    version,
    about = "Web push notification hub"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "PUSHHUB_ADDR", default_value = "127.0.0.1:5109")]
    addr: SocketAddr,
    #[arg(long, env = "PUSHHUB_DATA_DIR")]
    data_dir: Option<PathBuf>,
    #[arg(long, env = "PUSHHUB_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "PUSHHUB_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "PUSHHUB_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
    #[arg(long, env = "PUSHHUB_ADMIN_PASSWORD_HASH")]
    admin_password_hash: Option<String>,
    #[arg(long, env = "PUSHHUB_REMINDER_INTERVAL")]
    reminder_interval: Option<String>,
    #[arg(long, env = "PUSHHUB_REMINDER_THRESHOLD")]
    reminder_threshold: Option<String>,
    #[arg(long, env = "PUSHHUB_HEALTH_INTERVAL")]
    health_interval: Option<String>,
    #[arg(long, env = "PUSHHUB_DELIVERY_DEADLINE")]
    delivery_deadline: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a VAPID key pair.
    Init(InitArgs),
    /// Hash an admin password for --admin-password-hash.
    HashPassword(HashPasswordArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

#[derive(Args, Debug)]
struct HashPasswordArgs {
    password: String,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match pushhub::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => ("mailto:you@example.com".to_string(), true),
    };

    println!("PUSHHUB_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("PUSHHUB_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("PUSHHUB_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace PUSHHUB_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

fn run_hash_password(args: HashPasswordArgs) -> i32 {
    match pushhub::auth::hash_password(&args.password) {
        Ok(hash) => {
            println!("PUSHHUB_ADMIN_PASSWORD_HASH='{hash}'");
            0
        }
        Err(err) => {
            eprintln!("failed to hash password: {err}");
            1
        }
    }
}

fn resolve_hub_config(cli: &Cli) -> Result<HubConfig, String> {
    let defaults = HubConfig::default();
    let pick = |raw: Option<&str>, name: &str, default: Duration| match raw {
        Some(raw) => parse_duration(raw).map_err(|err| format!("{name}: {err}")),
        None => Ok(default),
    };
    Ok(HubConfig {
        reminder_interval: pick(
            cli.reminder_interval.as_deref(),
            "reminder interval",
            defaults.reminder_interval,
        )?,
        reminder_threshold: pick(
            cli.reminder_threshold.as_deref(),
            "reminder threshold",
            defaults.reminder_threshold,
        )?,
        health_interval: pick(
            cli.health_interval.as_deref(),
            "health interval",
            defaults.health_interval,
        )?,
        delivery_deadline: pick(
            cli.delivery_deadline.as_deref(),
            "delivery deadline",
            defaults.delivery_deadline,
        )?,
    })
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    let (amount, unit) = match value.chars().last() {
        Some(ch) if ch.is_ascii_alphabetic() => {
            (&value[..value.len() - 1], ch.to_ascii_lowercase())
        }
        _ => (value, 's'),
    };

    let amount: u64 = amount
        .parse()
        .map_err(|_| format!("invalid duration '{value}'; expected <number>[s|m|h|d]"))?;

    if amount == 0 {
        return Err("duration must be greater than 0".to_string());
    }

    let seconds = match unit {
        's' => Some(amount),
        'm' => amount.checked_mul(60),
        'h' => amount.checked_mul(3_600),
        'd' => amount.checked_mul(86_400),
        _ => {
            return Err(format!(
                "invalid duration '{value}'; expected <number>[s|m|h|d]"
            ));
        }
    };
    seconds
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{value}' is too large"))
}
