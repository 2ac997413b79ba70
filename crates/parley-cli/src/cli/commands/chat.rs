//! Transcript command handlers.
//!
//! Each invocation mounts a session, runs one action, and exits. The
//! typing flag is kept in the store under `<id>-typing` so it survives
//! between invocations.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use parley_core::attachment::{AttachmentResolver, StagedFile};
use parley_core::config::{Config, paths};
use parley_core::mime::normalize_input_path;
use parley_core::persistence::PersistenceStore;
use parley_core::session::{ChatSession, OutboundUpdate, SessionConfig};
use parley_core::staging::AttachmentPreview;
use parley_core::storage::{KeyValueStore, SharedStore, open_store};
use parley_render::terminal::{render_input_bar, render_view};
use parley_render::{Chrome, TranscriptView, render_transcript};
use parley_types::Message;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::ConversationArgs;

const TYPING_SUFFIX: &str = "-typing";

fn typing_key(conversation_id: &str) -> String {
    format!("{conversation_id}{TYPING_SUFFIX}")
}

/// A mounted session plus what the CLI needs around it.
pub struct Host {
    config: Config,
    store: SharedStore,
    session: ChatSession,
    outbound: mpsc::UnboundedReceiver<OutboundUpdate>,
}

impl Host {
    pub fn open(config: &Config, args: ConversationArgs) -> Result<Self> {
        let ConversationArgs { id, initial } = args;
        if id.trim().is_empty() {
            bail!("Conversation id must not be empty");
        }

        let initial = match initial {
            Some(path) => read_messages(Some(&path))?,
            None => Vec::new(),
        };

        let store = open_store(config.persistence_type, &paths::storage_dir());
        let mut session_config = SessionConfig::new(id.clone())
            .with_accept(config.supported_input_file_types.clone())
            .with_resolver(AttachmentResolver::new(config.max_attachment_bytes));
        if config.persistence {
            session_config =
                session_config.with_persistence(PersistenceStore::new(Arc::clone(&store)));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::mount(session_config, initial, tx)
            .with_context(|| format!("mount conversation '{id}'"))?;

        let typing = store
            .get(&typing_key(&id))
            .with_context(|| format!("read typing flag for '{id}'"))?
            .is_some_and(|v| v == "true");
        session.restore_typing(typing);

        Ok(Self {
            config: config.clone(),
            store,
            session,
            outbound: rx,
        })
    }

    fn save_typing(&self) -> Result<()> {
        let id = self.session.conversation_id();
        let key = typing_key(id);
        let result = if self.session.is_typing() {
            self.store.set(&key, "true")
        } else {
            self.store.remove(&key)
        };
        result.with_context(|| format!("save typing flag for '{id}'"))
    }
}

/// Reads a JSON message array from `path`, or stdin for `-`/`None`.
fn read_messages(path: Option<&Path>) -> Result<Vec<Message>> {
    let raw = match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("read messages from {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read messages from stdin")?;
            buf
        }
    };

    serde_json::from_str(&raw).context("parse messages (expected a JSON array)")
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    chrome: &'a Chrome,
    transcript: &'a TranscriptView,
}

pub fn show(host: &Host, json: bool, width: usize) -> Result<()> {
    let chrome = Chrome::from_config(&host.config);
    let view = render_transcript(
        host.session.messages(),
        host.session.is_typing(),
        host.config.typing_indicator,
        &chrome,
    );

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ShowOutput {
                chrome: &chrome,
                transcript: &view,
            })
            .context("serialize transcript view")?
        );
    } else {
        print!("{}", render_view(&view, width));
        println!(
            "{}",
            render_input_bar(
                &chrome.placeholder,
                &[
                    &host.config.file_attachment_button_config,
                    &host.config.send_button_config,
                ],
            )
        );
    }
    Ok(())
}

pub async fn send(mut host: Host, text: Option<String>, attach: Option<String>) -> Result<()> {
    let staging = host.session.staging_mut();
    if let Some(text) = text {
        staging.set_text(text);
    }
    if let Some(path) = attach {
        let file = StagedFile::from_path(normalize_input_path(&path));
        staging.set_attachment(Some(file))?;
    }

    if !host.session.staging().is_sendable() {
        bail!("Nothing to send: provide --text or --attach");
    }
    if let Some(preview) = host.session.staging().preview() {
        eprintln!("{}", describe_preview(&preview));
    }

    let Some(message) = host.session.send().await.context("send message")? else {
        bail!("Message was not sent");
    };
    debug!(id = ?message.id, "sent message");

    host.save_typing()?;

    while let Ok(update) = host.outbound.try_recv() {
        println!(
            "{}",
            serde_json::to_string(&update).context("serialize outbound update")?
        );
    }
    Ok(())
}

fn describe_preview(preview: &AttachmentPreview) -> String {
    match preview {
        AttachmentPreview::Image { file_name } => format!("Attached {file_name} (image)"),
        AttachmentPreview::Document { file_name } => format!("Attached {file_name} (document)"),
        AttachmentPreview::Unsupported { file_name } => {
            format!("Attached {file_name} (no preview)")
        }
    }
}

pub fn receive(mut host: Host, file: Option<&Path>) -> Result<()> {
    let incoming = read_messages(file)?;
    host.session
        .receive(incoming)
        .context("apply external update")?;
    host.save_typing()?;

    println!(
        "{}",
        serde_json::to_string_pretty(host.session.messages()).context("serialize transcript")?
    );
    Ok(())
}

pub fn clear(mut host: Host) -> Result<()> {
    host.session.clear().context("clear conversation")?;
    host.session.reset_typing();
    host.save_typing()?;
    host.session.teardown();

    println!("Cleared conversation {}.", host.session.conversation_id());
    Ok(())
}
