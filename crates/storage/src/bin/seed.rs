use std::fmt;

use chrono::{DateTime, Duration, Utc};
use dojo_core::model::{SessionSummary, Technique, TechniqueName};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    catalog: Option<String>,
    summaries: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSummaries { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSummaries { raw } => write!(f, "invalid --summaries value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("DOJO_DB_URL").unwrap_or_else(|_| "sqlite:dojo.sqlite3".into());
        let mut catalog = std::env::var("DOJO_CATALOG_FILE").ok();
        let mut summaries = std::env::var("DOJO_SUMMARIES")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--catalog" => {
                    catalog = Some(require_value(&mut args, "--catalog")?);
                }
                "--summaries" => {
                    let value = require_value(&mut args, "--summaries")?;
                    summaries = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidSummaries { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            catalog,
            summaries,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dojo.sqlite3)");
    eprintln!("  --catalog <path>          Technique catalog JSON (default: built-in sample)");
    eprintln!("  --summaries <n>           Number of session summaries to append (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  DOJO_DB_URL, DOJO_CATALOG_FILE, DOJO_SUMMARIES");
}

fn sample_catalog() -> Result<Vec<Technique>, Box<dyn std::error::Error>> {
    let samples = [
        ("Wrist Grab", "White", 1, "Grab", "Inward", "Palm Heel"),
        ("Front Choke", "White", 1, "Choke", "Pluck", "Knee"),
        ("Bear Hug", "Yellow", 2, "Hug", "Elbow", "Heel Stomp"),
        ("Headlock", "Yellow", 2, "Lock", "Hip", "Elbow"),
        ("Straight Punch", "Orange", 3, "Punch", "Outward", "Hammer Fist"),
    ];
    samples
        .iter()
        .enumerate()
        .map(|(i, (name, belt, belt_number, attack, block, strike))| {
            let number = u32::try_from(i + 1)?;
            Ok(Technique::new(TechniqueName::new(*name)?, number, *belt, *belt_number)
                .with_facets(*attack, *block, *strike)
                .with_kids(true))
        })
        .collect()
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let catalog = match &args.catalog {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str::<Vec<Technique>>(&raw)?
        }
        None => sample_catalog()?,
    };
    storage.techniques.replace_catalog(&catalog).await?;

    let names: Vec<TechniqueName> = catalog.iter().map(|t| t.name().clone()).collect();
    for i in 0..args.summaries {
        let days_ago = i64::from(i);
        let completed_at = now - Duration::days(days_ago);
        let take = names.len().min(3 + i as usize);
        let techniques = names[..take].to_vec();
        let flagged = techniques.first().cloned().into_iter().collect();
        let duration_ms = 4_000 * u64::try_from(take)?;

        let summary =
            SessionSummary::from_persisted(completed_at, techniques, duration_ms, flagged)?;
        let _ = storage.session_summaries.append_summary(&summary).await?;
    }

    println!(
        "Seeded {} techniques and {} session summaries into {}",
        catalog.len(),
        args.summaries,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
