//! Interactive interview room on a line-oriented terminal.
//!
//! Plain lines are appended to the local buffer; `:edit` replaces the buffer
//! with the lines that follow, up to a lone `.`. Every local change goes
//! through a [`Debouncer`], so bursts of typing reach the store as a single
//! update. Store notifications are forwarded over a channel and summarised
//! between commands.

use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use colored::*;

use crate::client::InterviewClient;
use crate::debounce::Debouncer;
use crate::error::{CollabError, Result};
use crate::forms::{CreateSessionForm, JoinSessionForm};
use crate::language::Language;
use crate::present;
use crate::session::Session;
use crate::store::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Run,
    Lang(String),
    Join(String),
    /// Mark a participant offline by id or name; `None` means the host leaves.
    Leave(Option<String>),
    Show,
    Who,
    Clear,
    Edit,
    Help,
    Quit,
    /// A line of code to append to the buffer.
    Line(String),
    Unknown(String),
}

pub fn parse_command(line: &str) -> ReplCommand {
    let Some(rest) = line.strip_prefix(':') else {
        return ReplCommand::Line(line.to_string());
    };
    let mut parts = rest.trim().splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or("");
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());
    match (verb, arg) {
        ("run" | "r", None) => ReplCommand::Run,
        ("lang" | "language", Some(a)) => ReplCommand::Lang(a.to_string()),
        ("join", Some(a)) => ReplCommand::Join(a.to_string()),
        ("leave", a) => ReplCommand::Leave(a.map(str::to_string)),
        ("show", None) => ReplCommand::Show,
        ("who", None) => ReplCommand::Who,
        ("clear", None) => ReplCommand::Clear,
        ("edit", None) => ReplCommand::Edit,
        ("help" | "h" | "?", None) => ReplCommand::Help,
        ("quit" | "q" | "exit", None) => ReplCommand::Quit,
        _ => ReplCommand::Unknown(line.to_string()),
    }
}

pub const HELP: &str = "\
commands:
  <text>          append a line to the code buffer
  :edit           replace the buffer; finish with a line containing only '.'
  :clear          empty the buffer
  :show           print the buffer
  :run            execute the buffer
  :lang <name>    switch language (resets the buffer to the template)
  :join <name>    add a candidate to the session
  :leave [who]    mark a participant offline (no argument: host leaves and quits)
  :who            list participants
  :quit           leave the room";

/// Human-readable lines describing what changed between two snapshots.
pub fn change_summary(prev: &Session, next: &Session) -> Vec<String> {
    let mut lines = Vec::new();
    for p in &next.participants {
        match prev.participant(&p.id) {
            None => lines.push(format!("+ {} joined", p.name)),
            Some(old) if old.is_online && !p.is_online => lines.push(format!("- {} left", p.name)),
            Some(old) if !old.is_online && p.is_online => lines.push(format!("+ {} is back", p.name)),
            _ => {}
        }
    }
    if prev.language != next.language {
        lines.push(format!("language is now {}", next.language.label()));
    } else if prev.code != next.code {
        lines.push(format!("code updated ({} lines)", next.code.lines().count()));
    }
    if prev.output != next.output {
        if let Some(result) = &next.output {
            let status = if result.success { "ok" } else { "failed" };
            lines.push(format!("run finished: {}", status));
        }
    }
    lines
}

pub struct RoomOptions {
    pub title: String,
    pub language: Language,
    pub host: String,
    pub debounce: Duration,
}

struct Room<'w, W: Write> {
    client: InterviewClient,
    debouncer: Debouncer<String>,
    updates: mpsc::UnboundedReceiver<Session>,
    last_seen: Session,
    local_code: String,
    host_id: String,
    out: &'w mut W,
}

impl<W: Write> Room<'_, W> {
    /// Print summaries for every notification received since the last call.
    fn drain_updates(&mut self) -> Result<()> {
        while let Ok(next) = self.updates.try_recv() {
            for line in change_summary(&self.last_seen, &next) {
                writeln!(self.out, "{} {}", "·".dimmed(), line.dimmed())?;
            }
            self.last_seen = next;
        }
        Ok(())
    }

    fn push_local(&mut self) {
        self.debouncer.push(self.local_code.clone());
    }

    fn current(&self) -> Option<Session> {
        self.client.state().session
    }

    async fn run_code(&mut self) -> Result<()> {
        // Make sure the buffer the user sees is the one that runs.
        if self.current().map(|s| s.code) != Some(self.local_code.clone()) {
            self.client.update_code(&self.local_code).await;
        }
        writeln!(self.out, "{}", present::render_output(None, true))?;
        let result = self.client.execute_code().await;
        writeln!(self.out, "{}", present::render_output(result.as_ref(), false))?;
        Ok(())
    }

    async fn change_language(&mut self, name: &str) -> Result<()> {
        let language = match name.parse::<Language>() {
            Ok(l) => l,
            Err(e) => {
                writeln!(self.out, "{}", e.to_string().yellow())?;
                return Ok(());
            }
        };
        self.client.change_language(language).await;
        if let Some(session) = self.current() {
            // Supersede any edit still waiting in the debouncer.
            self.local_code = session.code;
            self.push_local();
        }
        Ok(())
    }

    async fn join(&mut self, name: &str) -> Result<()> {
        let form = JoinSessionForm {
            session_id: self.last_seen.id.clone(),
            participant_name: name.to_string(),
        };
        let Some(valid) = form.validate() else {
            writeln!(self.out, "{}", "a participant name is required".yellow())?;
            return Ok(());
        };
        match self
            .client
            .store()
            .join_session(&valid.session_id, &valid.participant_name)
            .await
        {
            Ok(outcome) => writeln!(
                self.out,
                "{} joined as {}",
                valid.participant_name.bold(),
                outcome.participant_id.dimmed()
            )?,
            Err(e) => writeln!(self.out, "{}", e.to_string().red())?,
        }
        Ok(())
    }

    async fn leave(&mut self, who: &str) -> Result<()> {
        let target = self.current().and_then(|s| {
            s.participants
                .iter()
                .find(|p| p.id == who || p.name == who)
                .map(|p| p.id.clone())
        });
        match target {
            Some(id) if id == self.host_id => {
                writeln!(self.out, "{}", "use :leave without arguments to leave as host".yellow())?;
            }
            Some(id) => {
                self.client
                    .store()
                    .leave_session(&self.last_seen.id, &id)
                    .await;
            }
            None => writeln!(self.out, "{}", format!("no participant '{}'", who).yellow())?,
        }
        Ok(())
    }

    fn who(&mut self) -> Result<()> {
        let Some(session) = self.current() else {
            return Ok(());
        };
        writeln!(
            self.out,
            "{}",
            present::render_participants(&session.participants, Some(&self.host_id))
        )?;
        for p in &session.participants {
            let status = if p.is_online { "online".green() } else { "offline".dimmed() };
            let role = if p.is_host { " (host)" } else { "" };
            writeln!(self.out, "  {}{}  {}  {}", p.name, role, status, p.id.dimmed())?;
        }
        Ok(())
    }
}

/// Run an interactive room until `:quit`, `:leave` or end of input.
///
/// Returns the final session snapshot.
pub async fn run_room<R, W>(
    store: SessionStore,
    options: RoomOptions,
    input: R,
    out: &mut W,
) -> Result<Session>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let form = CreateSessionForm {
        title: options.title,
        language: options.language,
        host_name: options.host,
    };
    let request = form
        .validate()
        .ok_or(CollabError::InvalidForm("title and host name are required"))?;

    let client = InterviewClient::new(store);
    let session = client
        .create_session(&request.title, request.language, &request.host_name)
        .await?;
    let host_id = session
        .host()
        .map(|h| h.id.clone())
        .unwrap_or_default();
    client.attach(&session.id, Some(&host_id)).await;

    let (tx, updates) = mpsc::unbounded_channel();
    let _feed = client.store().subscribe(&session.id, move |s| {
        let _ = tx.send(s);
    });

    let sync = client.clone();
    let debouncer = Debouncer::spawn(options.debounce, move |code: String| {
        let sync = sync.clone();
        async move { sync.update_code(&code).await }
    });

    writeln!(out, "{}", present::render_header(&session, Some(&host_id)))?;
    writeln!(
        out,
        "share: {}   (:help for commands)",
        present::share_link("", &session.id).bright_cyan()
    )?;

    let mut room = Room {
        client,
        debouncer,
        updates,
        last_seen: session.clone(),
        local_code: session.code.clone(),
        host_id,
        out,
    };

    let mut lines = input.lines();
    let mut editing: Option<String> = None;
    let mut host_left = false;

    while let Some(line) = lines.next_line().await? {
        if let Some(buffer) = editing.as_mut() {
            if line.trim() == "." {
                editing = None;
            } else {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);
                room.local_code = buffer.clone();
                room.push_local();
            }
            continue;
        }

        match parse_command(&line) {
            ReplCommand::Line(text) => {
                if !room.local_code.is_empty() {
                    room.local_code.push('\n');
                }
                room.local_code.push_str(&text);
                room.push_local();
            }
            ReplCommand::Edit => {
                editing = Some(String::new());
                room.local_code.clear();
                room.push_local();
            }
            ReplCommand::Clear => {
                room.local_code.clear();
                room.push_local();
            }
            ReplCommand::Show => {
                let listing = present::render_code(&room.local_code);
                writeln!(room.out, "{}", listing)?;
            }
            ReplCommand::Run => room.run_code().await?,
            ReplCommand::Lang(name) => room.change_language(&name).await?,
            ReplCommand::Join(name) => room.join(&name).await?,
            ReplCommand::Leave(Some(who)) => room.leave(&who).await?,
            ReplCommand::Leave(None) => {
                host_left = true;
                break;
            }
            ReplCommand::Who => room.who()?,
            ReplCommand::Help => writeln!(room.out, "{}", HELP)?,
            ReplCommand::Quit => break,
            ReplCommand::Unknown(raw) => {
                writeln!(room.out, "{}", format!("unknown command: {}", raw).yellow())?
            }
        }
        room.drain_updates()?;
    }

    let Room { client, debouncer, mut updates, mut last_seen, out, .. } = room;
    debouncer.shutdown().await;
    if host_left {
        client.leave_session().await;
    }
    while let Ok(next) = updates.try_recv() {
        for line in change_summary(&last_seen, &next) {
            writeln!(out, "{} {}", "·".dimmed(), line.dimmed())?;
        }
        last_seen = next;
    }
    client.detach();
    tracing::info!(target: "collab::repl", session_id = %last_seen.id, "room closed");

    Ok(client
        .store()
        .get_session(&last_seen.id)
        .await
        .unwrap_or(last_seen))
}
