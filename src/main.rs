use clap::{CommandFactory, Parser};
use colored::*;
use std::io::{self, Write};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use live_code_collab::cli::{log_filter, resolve_language, Args, Command};
use live_code_collab::forms::{session_id_from_link, JoinSessionForm};
use live_code_collab::present;
use live_code_collab::repl::{self, RoomOptions};
use live_code_collab::{
    AppConfig, CodeChange, CodeExecutor, CollabError, Language, LatencyProfile, SessionStore,
};

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn print_languages() {
    println!(
        "{:<12} {:<12} {:<6} {}",
        "KEY".bold(),
        "LABEL".bold(),
        "EXT".bold(),
        "RUNS".bold()
    );
    for language in Language::ALL {
        let config = language.config();
        let runs = if language.is_directly_executable() {
            "yes".green()
        } else {
            "mock".dimmed()
        };
        println!(
            "{:<12} {:<12} {:<6} {}",
            language.key(),
            config.label,
            config.extension,
            runs
        );
    }
}

async fn run_file(
    config: &AppConfig,
    file: &std::path::Path,
    explicit: Option<Language>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let language = resolve_language(file, explicit).ok_or_else(|| {
        format!(
            "cannot tell the language of {}; pass --language",
            file.display()
        )
    })?;
    let code = std::fs::read_to_string(file)?;

    let store = SessionStore::new(
        LatencyProfile::instant(),
        CodeExecutor::new(config.executor.clone()),
    );
    let session = store
        .create_session(&file.display().to_string(), language, "runner")
        .await;
    let host_id = session.host().map(|h| h.id.clone()).unwrap_or_default();
    store
        .update_code(CodeChange::new(session.id.clone(), host_id, code))
        .await?;
    let result = store.execute_code(&session.id).await?;

    println!("{}", present::render_output(Some(&result), false));
    Ok(result.success)
}

async fn run_demo(config: &AppConfig, language: Language) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::from_config(config);
    let session = store
        .create_session("Demo Interview", language, "Interviewer")
        .await;
    let host_id = session.host().map(|h| h.id.clone()).unwrap_or_default();

    let link = present::share_link("", &session.id);
    println!("{}", present::render_header(&session, Some(&host_id)));
    println!("{}", link.bright_cyan());

    let watcher_host = host_id.clone();
    let _watch = store.subscribe(&session.id, move |s| {
        println!(
            "{} {}",
            "⟳".bright_blue(),
            present::render_header(&s, Some(&watcher_host))
        );
    });

    // The candidate opens the share link.
    let form = JoinSessionForm {
        participant_name: "Candidate".to_string(),
        ..JoinSessionForm::for_session(session_id_from_link(&link))
    };
    let request = form
        .validate()
        .ok_or(CollabError::InvalidForm("session id and name are required"))?;
    let joined = store
        .join_session(&request.session_id, &request.participant_name)
        .await?;
    let candidate = joined.participant_id;

    let solution = "function solution(input) {\n  return input.split('').reverse().join('');\n}\n\nconsole.log(solution(\"Hello, World!\"));";
    let mut typed = String::new();
    for line in solution.lines() {
        if !typed.is_empty() {
            typed.push('\n');
        }
        typed.push_str(line);
        store
            .update_code(CodeChange::new(session.id.clone(), candidate.clone(), typed.clone()))
            .await?;
    }
    if language != Language::Javascript {
        store.change_language(&session.id, language).await?;
    }

    let current = store.get_session(&session.id).await;
    if let Some(current) = &current {
        println!("{}", present::render_code(&current.code));
    }
    println!("{}", present::render_output(None, true));
    let result = store.execute_code(&session.id).await?;
    println!("{}", present::render_output(Some(&result), false));

    store.leave_session(&session.id, &candidate).await;
    Ok(())
}

async fn run_room(
    config: &AppConfig,
    title: String,
    language: Language,
    host: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::from_config(config);
    let options = RoomOptions {
        title,
        language,
        host,
        debounce: config.editor.debounce(),
    };
    let input = BufReader::new(tokio::io::stdin());
    let mut out = io::stdout();
    let session = repl::run_room(store, options, input, &mut out).await?;
    writeln!(
        out,
        "{} {} ({} online)",
        "session closed:".dimmed(),
        session.id,
        session.online_count()
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(args.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = AppConfig::load(args.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match args.command {
        Command::Languages => print_languages(),
        Command::Template { language } => println!("{}", language.default_code()),
        Command::Run { file, language } => {
            if !run_file(&config, &file, language).await? {
                std::process::exit(1);
            }
        }
        Command::Demo { language } => run_demo(&config, language).await?,
        Command::Room {
            title,
            language,
            host,
        } => run_room(&config, title, language, host).await?,
        Command::Completions { shell } => {
            let mut cmd = Args::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
