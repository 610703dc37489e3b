mod practice;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dojo_core::model::{Audience, PlaylistName, PracticeSettingsDraft, TechniqueName};
use services::sessions::CommandSpeech;
use services::{AppServices, BeltSelection, Clock, SearchFilters, SpeechEngine};

use crate::practice::{ConsoleSpeech, PracticeRun};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidVoice { raw: String },
    InvalidReminder { raw: String },
    InvalidName { raw: String },
    NoPracticeSource,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidVoice { raw } => write!(f, "invalid --voice value: {raw:?}"),
            ArgsError::InvalidReminder { raw } => {
                write!(f, "invalid --reminder value (expected HH:MM or off): {raw}")
            }
            ArgsError::InvalidName { raw } => write!(f, "names cannot be blank: {raw:?}"),
            ArgsError::NoPracticeSource => {
                write!(f, "practice needs one of --playlist, --flagged or --belts")
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

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn technique_name(raw: String) -> Result<TechniqueName, ArgsError> {
    TechniqueName::new(raw.clone()).map_err(|_| ArgsError::InvalidName { raw })
}

fn playlist_name(raw: String) -> Result<PlaylistName, ArgsError> {
    PlaylistName::new(raw.clone()).map_err(|_| ArgsError::InvalidName { raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  dojo practice (--playlist <name> | --flagged | --belts <b1,b2> [--kids])");
    eprintln!("                [--delay-ms <ms>] [--voice <command>]");
    eprintln!("  dojo search [<text>] [--belt <b>] [--attack <a>] [--block <b>] [--strike <s>]");
    eprintln!("  dojo belts");
    eprintln!("  dojo flag <technique>");
    eprintln!("  dojo flagged");
    eprintln!("  dojo playlist list");
    eprintln!("  dojo playlist create|delete <name>");
    eprintln!("  dojo playlist rename <from> <to>");
    eprintln!("  dojo playlist add|remove|toggle <name> <technique>");
    eprintln!("  dojo view <technique>");
    eprintln!("  dojo import [--file <path> | --url <url>]");
    eprintln!("  dojo history [--limit <n>] [--clear]");
    eprintln!("  dojo stats");
    eprintln!("  dojo settings [--delay-ms <ms>] [--reminder <HH:MM|off>] [--reset-delay]");
    eprintln!();
    eprintln!("All commands accept --db <sqlite_url> (default sqlite:dojo.sqlite3).");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DOJO_DB_URL, DOJO_CATALOG_URL, DOJO_VOICE, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PracticeSource {
    Playlist(PlaylistName),
    Flagged,
    Belts { belts: Vec<String>, audience: Audience },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImportSource {
    File(String),
    Url(String),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlaylistCommand {
    List,
    Create(PlaylistName),
    Delete(PlaylistName),
    Rename(PlaylistName, PlaylistName),
    Add(PlaylistName, TechniqueName),
    Remove(PlaylistName, TechniqueName),
    Toggle(PlaylistName, TechniqueName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reminder {
    Keep,
    Off,
    At(u8, u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Practice {
        source: PracticeSource,
        delay_ms: Option<u32>,
        voice: Option<String>,
    },
    Search {
        query: String,
        filters: SearchFilters,
    },
    Belts,
    Flag(TechniqueName),
    Flagged,
    Playlist(PlaylistCommand),
    View(TechniqueName),
    Import(ImportSource),
    History {
        limit: Option<usize>,
        clear: bool,
    },
    Stats,
    Settings {
        delay_ms: Option<u32>,
        reminder: Reminder,
        reset_delay: bool,
    },
}

/// Every flag any subcommand understands; each command picks what it needs.
#[derive(Debug, Default)]
struct Options {
    playlist: Option<String>,
    flagged: bool,
    belts: Vec<String>,
    kids: bool,
    delay_ms: Option<u32>,
    voice: Option<String>,
    filters: SearchFilters,
    file: Option<String>,
    url: Option<String>,
    limit: Option<usize>,
    clear: bool,
    reminder: Option<String>,
    reset_delay: bool,
}

struct Args {
    db_url: String,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter();
        let name = args
            .next()
            .ok_or(ArgsError::MissingArgument { what: "command" })?;

        let mut db_url = normalize_sqlite_url(
            std::env::var("DOJO_DB_URL").unwrap_or_else(|_| "sqlite:dojo.sqlite3".into()),
        );
        let mut opts = Options {
            voice: std::env::var("DOJO_VOICE").ok(),
            ..Options::default()
        };
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--playlist" => opts.playlist = Some(require_value(&mut args, "--playlist")?),
                "--flagged" => opts.flagged = true,
                "--belts" => {
                    let value = require_value(&mut args, "--belts")?;
                    opts.belts.extend(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|b| !b.is_empty())
                            .map(str::to_owned),
                    );
                }
                "--kids" => opts.kids = true,
                "--delay-ms" => {
                    let value = require_value(&mut args, "--delay-ms")?;
                    opts.delay_ms = Some(parse_number(value, "--delay-ms")?);
                }
                "--voice" => opts.voice = Some(require_value(&mut args, "--voice")?),
                "--belt" => opts.filters.belt.push(require_value(&mut args, "--belt")?),
                "--attack" => opts.filters.attack.push(require_value(&mut args, "--attack")?),
                "--block" => opts.filters.block.push(require_value(&mut args, "--block")?),
                "--strike" => opts.filters.strike.push(require_value(&mut args, "--strike")?),
                "--file" => opts.file = Some(require_value(&mut args, "--file")?),
                "--url" => opts.url = Some(require_value(&mut args, "--url")?),
                "--limit" => {
                    let value = require_value(&mut args, "--limit")?;
                    opts.limit = Some(parse_number(value, "--limit")?);
                }
                "--clear" => opts.clear = true,
                "--reminder" => opts.reminder = Some(require_value(&mut args, "--reminder")?),
                "--reset-delay" => opts.reset_delay = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let command = Self::command(&name, opts, positional)?;
        Ok(Self { db_url, command })
    }

    fn command(name: &str, opts: Options, positional: Vec<String>) -> Result<Command, ArgsError> {
        let mut positional = positional.into_iter();
        let mut next = |what: &'static str| {
            positional
                .next()
                .ok_or(ArgsError::MissingArgument { what })
        };

        let command = match name {
            "practice" => {
                let source = if let Some(name) = opts.playlist {
                    PracticeSource::Playlist(playlist_name(name)?)
                } else if opts.flagged {
                    PracticeSource::Flagged
                } else if !opts.belts.is_empty() {
                    let audience = if opts.kids {
                        Audience::Kids
                    } else {
                        Audience::Adults
                    };
                    PracticeSource::Belts {
                        belts: opts.belts,
                        audience,
                    }
                } else {
                    return Err(ArgsError::NoPracticeSource);
                };
                Command::Practice {
                    source,
                    delay_ms: opts.delay_ms,
                    voice: opts.voice,
                }
            }
            "search" => Command::Search {
                query: next("search text").unwrap_or_default(),
                filters: opts.filters,
            },
            "belts" => Command::Belts,
            "flag" => Command::Flag(technique_name(next("technique")?)?),
            "flagged" => Command::Flagged,
            "view" => Command::View(technique_name(next("technique")?)?),
            "playlist" => {
                let action = next("playlist action")?;
                let playlist = match action.as_str() {
                    "list" => PlaylistCommand::List,
                    "create" => PlaylistCommand::Create(playlist_name(next("playlist name")?)?),
                    "delete" => PlaylistCommand::Delete(playlist_name(next("playlist name")?)?),
                    "rename" => PlaylistCommand::Rename(
                        playlist_name(next("playlist name")?)?,
                        playlist_name(next("new playlist name")?)?,
                    ),
                    "add" | "remove" | "toggle" => {
                        let playlist = playlist_name(next("playlist name")?)?;
                        let technique = technique_name(next("technique")?)?;
                        match action.as_str() {
                            "add" => PlaylistCommand::Add(playlist, technique),
                            "remove" => PlaylistCommand::Remove(playlist, technique),
                            _ => PlaylistCommand::Toggle(playlist, technique),
                        }
                    }
                    _ => return Err(ArgsError::UnknownArg(action)),
                };
                Command::Playlist(playlist)
            }
            "import" => Command::Import(match (opts.file, opts.url) {
                (Some(path), _) => ImportSource::File(path),
                (None, Some(url)) => ImportSource::Url(url),
                (None, None) => ImportSource::Default,
            }),
            "history" => Command::History {
                limit: opts.limit,
                clear: opts.clear,
            },
            "stats" => Command::Stats,
            "settings" => Command::Settings {
                delay_ms: opts.delay_ms,
                reminder: opts.reminder.map_or(Ok(Reminder::Keep), parse_reminder)?,
                reset_delay: opts.reset_delay,
            },
            other => return Err(ArgsError::UnknownArg(other.to_owned())),
        };

        if let Ok(extra) = next("") {
            return Err(ArgsError::UnknownArg(extra));
        }
        Ok(command)
    }
}

fn parse_reminder(raw: String) -> Result<Reminder, ArgsError> {
    if raw == "off" {
        return Ok(Reminder::Off);
    }
    let parsed = raw
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<u8>().ok()?, m.parse::<u8>().ok()?)));
    match parsed {
        Some((hour, minute)) => Ok(Reminder::At(hour, minute)),
        None => Err(ArgsError::InvalidReminder { raw }),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn format_duration(ms: u64) -> String {
    let secs = ms / 1_000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

async fn practice(
    app: &AppServices,
    source: PracticeSource,
    delay_ms: Option<u32>,
    voice: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = app.library();
    let list = match source {
        PracticeSource::Playlist(name) => library.playlist_techniques(&name)?,
        PracticeSource::Flagged => library.flagged_techniques(),
        PracticeSource::Belts { belts, audience } => {
            let selections: Vec<BeltSelection> = belts
                .into_iter()
                .map(|belt| BeltSelection::new(belt, audience))
                .collect();
            library.random_list(&selections, &mut rand::rng())
        }
    };
    if list.is_empty() {
        println!("nothing to practice");
        return Ok(());
    }
    library.set_current_list(list.clone());

    let delay = match delay_ms {
        Some(0) => {
            let err = ArgsError::InvalidNumber {
                flag: "--delay-ms",
                raw: "0".into(),
            };
            return Err(err.into());
        }
        Some(ms) => Duration::from_millis(u64::from(ms)),
        None => app.settings().load().await?.delay(),
    };
    let engine: Arc<dyn SpeechEngine> = match voice {
        Some(raw) => {
            let speech =
                CommandSpeech::parse(&raw).ok_or(ArgsError::InvalidVoice { raw: raw.clone() })?;
            log::info!("narrating with {}", speech.program());
            Arc::new(speech)
        }
        None => Arc::new(ConsoleSpeech::new(Duration::from_millis(1_500))),
    };

    let finished = practice::run(PracticeRun {
        items: list.iter().map(|t| t.name().clone()).collect(),
        delay,
        clock: app.clock(),
        engine,
        flags: library,
        recorder: app.recorder(),
    })
    .await?;

    app.recorder().flush().await;
    if !finished {
        println!("session stopped early; nothing recorded");
    }
    Ok(())
}

async fn playlist(
    app: &AppServices,
    command: PlaylistCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = app.library();
    match command {
        PlaylistCommand::List => {
            for playlist in library.playlists().iter() {
                println!("{} ({})", playlist.name(), playlist.techniques().len());
                for technique in playlist.techniques() {
                    println!("  {technique}");
                }
            }
        }
        PlaylistCommand::Create(name) => {
            if !library.create_playlist(name.clone()).await? {
                println!("playlist {name} already exists");
            }
        }
        PlaylistCommand::Delete(name) => {
            if !library.delete_playlist(&name).await? {
                println!("no playlist named {name}");
            }
        }
        PlaylistCommand::Rename(from, to) => library.rename_playlist(&from, to).await?,
        PlaylistCommand::Add(name, technique) => {
            if !library.add_to_playlist(&name, &technique).await? {
                println!("{technique} is already in {name}");
            }
        }
        PlaylistCommand::Remove(name, technique) => {
            if !library.remove_from_playlist(&name, &technique).await? {
                println!("{technique} is not in {name}");
            }
        }
        PlaylistCommand::Toggle(name, technique) => {
            let kind = library.toggle_in_playlist(&name, &technique).await?;
            println!("{technique}: {}", kind.as_str());
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.is_empty() || matches!(argv[0].as_str(), "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let parsed = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, Clock::system()).await?;
    log::debug!("opened {}", parsed.db_url);

    match parsed.command {
        Command::Practice {
            source,
            delay_ms,
            voice,
        } => practice(&app, source, delay_ms, voice).await?,
        Command::Search { query, filters } => {
            for technique in app.catalog().search(&query, &filters).await? {
                println!(
                    "{:<32} {:<8} {} / {} / {}",
                    technique.name().as_str(),
                    technique.belt(),
                    technique.attack(),
                    technique.block(),
                    technique.strike()
                );
            }
        }
        Command::Belts => {
            for belt in app.library().belts() {
                let kids = if belt.has_kids { " (kids)" } else { "" };
                println!("{}. {}{kids}", belt.belt_number, belt.name);
            }
        }
        Command::Flag(name) => {
            let kind = app.library().toggle_flag(&name).await?;
            println!("{name}: {}", kind.as_str());
        }
        Command::Flagged => {
            for technique in app.library().flagged_techniques() {
                println!("{}", technique.name());
            }
        }
        Command::Playlist(command) => playlist(&app, command).await?,
        Command::View(name) => {
            let library = app.library();
            let technique = library
                .technique(&name)
                .ok_or(services::LibraryError::UnknownTechnique(name.clone()))?;
            library.record_view(&name).await?;
            println!("{} ({} belt #{})", technique.name(), technique.belt(), technique.number());
            println!("  attack: {}", technique.attack());
            println!("  block:  {}", technique.block());
            println!("  strike: {}", technique.strike());
            if !technique.link().is_empty() {
                println!("  video:  {}", technique.link());
            }
        }
        Command::Import(source) => {
            let catalog = app.catalog();
            let stored = match source {
                ImportSource::File(path) => catalog.import_file(&path).await?,
                ImportSource::Url(url) => catalog.with_url(url).download().await?,
                ImportSource::Default => catalog.download().await?,
            };
            app.library().load().await?;
            println!("imported {stored} techniques");
        }
        Command::History { limit, clear } => {
            let history = app.history();
            if clear {
                history.clear().await?;
                println!("history cleared");
                return Ok(());
            }
            for item in history.list_recent(limit).await? {
                println!(
                    "{}  {:>3} techniques  {:>2} flagged  {}",
                    item.completed_at.format("%Y-%m-%d %H:%M"),
                    item.technique_count,
                    item.flagged_count,
                    format_duration(item.duration_ms)
                );
            }
        }
        Command::Stats => {
            let stats = app.stats().compute().await?;
            println!("sessions:          {}", stats.total_sessions);
            println!("techniques:        {}", stats.total_techniques);
            println!("unique techniques: {}", stats.unique_techniques);
            println!("views:             {}", stats.total_views);
            println!("flags:             {}", stats.total_flags);
            println!("playlist adds:     {}", stats.total_playlist_adds);
            println!("longest streak:    {} days", stats.longest_streak);
            for (title, board) in [
                ("most practiced", &stats.most_practiced),
                ("most viewed", &stats.most_viewed),
                ("most flagged", &stats.most_flagged),
                ("most playlisted", &stats.most_playlisted),
            ] {
                if board.is_empty() {
                    continue;
                }
                println!("{title}:");
                for (name, count) in board {
                    println!("  {count:>4}  {name}");
                }
            }
            if !stats.achievements.is_empty() {
                println!("achievements:");
                for achievement in &stats.achievements {
                    println!("  {}", achievement.label());
                }
            }
        }
        Command::Settings {
            delay_ms,
            reminder,
            reset_delay,
        } => {
            let settings = app.settings();
            let mut current = if reset_delay {
                settings.reset_delay().await?
            } else {
                settings.load().await?
            };
            if delay_ms.is_some() || reminder != Reminder::Keep {
                let mut draft: PracticeSettingsDraft = current.to_draft();
                if delay_ms.is_some() {
                    draft.delay_ms = delay_ms;
                }
                match reminder {
                    Reminder::Keep => {}
                    Reminder::Off => {
                        draft.reminder_hour = None;
                        draft.reminder_minute = None;
                    }
                    Reminder::At(hour, minute) => {
                        draft.reminder_hour = Some(hour);
                        draft.reminder_minute = Some(minute);
                    }
                }
                current = settings.save(draft).await?;
            }
            println!("delay between techniques: {} ms", current.delay_ms());
            match current.reminder() {
                Some(at) => println!("daily reminder: {:02}:{:02}", at.hour(), at.minute()),
                None => println!("daily reminder: off"),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, ArgsError> {
        Args::parse(args.iter().map(|a| (*a).to_owned()).collect()).map(|a| a.command)
    }

    #[test]
    fn practice_from_belts_splits_the_list() {
        let command = parse(&["practice", "--belts", "White, Yellow", "--kids"]).unwrap();
        assert_eq!(
            command,
            Command::Practice {
                source: PracticeSource::Belts {
                    belts: vec!["White".into(), "Yellow".into()],
                    audience: Audience::Kids,
                },
                delay_ms: None,
                voice: std::env::var("DOJO_VOICE").ok(),
            }
        );
    }

    #[test]
    fn practice_without_a_source_is_rejected() {
        assert!(matches!(parse(&["practice"]), Err(ArgsError::NoPracticeSource)));
    }

    #[test]
    fn playlist_add_takes_two_names() {
        let command = parse(&["playlist", "add", "warmup", "Bear Hug"]).unwrap();
        assert_eq!(
            command,
            Command::Playlist(PlaylistCommand::Add(
                PlaylistName::new("warmup").unwrap(),
                TechniqueName::new("Bear Hug").unwrap(),
            ))
        );
        assert!(matches!(
            parse(&["playlist", "add", "warmup"]),
            Err(ArgsError::MissingArgument { .. })
        ));
    }

    #[test]
    fn reminder_parses_clock_time_or_off() {
        assert_eq!(parse_reminder("07:30".into()).unwrap(), Reminder::At(7, 30));
        assert_eq!(parse_reminder("off".into()).unwrap(), Reminder::Off);
        assert!(parse_reminder("7h".into()).is_err());
    }

    #[test]
    fn extra_arguments_are_rejected() {
        assert!(matches!(parse(&["stats", "now"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_db_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:dojo.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("/dojo.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }

    #[test]
    fn durations_render_as_minutes_and_seconds() {
        assert_eq!(format_duration(3_020), "0:03");
        assert_eq!(format_duration(125_000), "2:05");
    }
}
