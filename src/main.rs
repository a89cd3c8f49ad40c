use std::io::Write as _;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use org_memory::http::{FileUpload, HttpBackend};
use org_memory::{
    documents, AskOutcome, ClientConfig, ConversationStore, DocumentLibrary, DocumentRef, Message,
};

const HELP: &str = "\
Ask anything about your organization's documents.
  /docs             list uploaded documents
  /upload <path>    upload a document (needs ORG_MEMORY_ADMIN_KEY)
  /delete <name>    delete a document
  /help             show this help
  /quit             exit";

#[derive(Debug, PartialEq)]
enum Command<'a> {
    Ask(&'a str),
    Docs,
    Upload(&'a str),
    Delete(&'a str),
    Help,
    Quit,
    Unknown(&'a str),
}

/// Trims only to recognise commands; questions go out as typed.
fn parse(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Ask(line);
    };
    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((rest, ""));
    match name {
        "docs" => Command::Docs,
        "upload" if !arg.is_empty() => Command::Upload(arg),
        "delete" if !arg.is_empty() => Command::Delete(arg),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(trimmed),
    }
}

fn render_reply(msg: &Message) -> String {
    let mut out = format!("assistant> {}", msg.content);
    if let Some(err) = &msg.error {
        out.push_str(&format!("\n  error: {err}"));
        return out;
    }
    if let Some(confidence) = &msg.confidence {
        out.push_str(&format!("\n  confidence: {confidence}"));
    }
    let sources = msg.source_labels();
    if !sources.is_empty() {
        out.push_str(&format!("\n  sources: {}", sources.join(", ")));
    }
    out
}

fn render_documents(library: &DocumentLibrary) -> String {
    if library.is_empty() {
        return "No documents uploaded".to_string();
    }
    library
        .documents()
        .iter()
        .map(|d| format!("  - {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn prompt() {
    print!("you> ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Logs go to stderr so they don't interleave with the transcript
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "org_memory=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env();
    info!("Using backend at {}", config.api_base_url);

    let backend = HttpBackend::new(&config);
    let store = ConversationStore::new();
    let mut library = DocumentLibrary::default();

    if let Err(e) = documents::refresh(&backend, &mut library).await {
        eprintln!("⚠ {}", e.user_message());
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();
        let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read from stdin")?
        else {
            break;
        };

        match parse(&line) {
            Command::Ask(question) => match store.ask(&backend, question).await {
                AskOutcome::Replied(reply) => println!("{}", render_reply(&reply)),
                AskOutcome::Blank => {}
                AskOutcome::Busy => println!("Still waiting for the previous answer."),
            },
            Command::Docs => match documents::refresh(&backend, &mut library).await {
                Ok(()) => println!("{}", render_documents(&library)),
                Err(e) => eprintln!("⚠ {}", e.user_message()),
            },
            Command::Upload(path) => {
                let file = match FileUpload::from_path(path).await {
                    Ok(file) => file,
                    Err(e) => {
                        eprintln!("⚠ Cannot read {path}: {e}");
                        continue;
                    }
                };
                let key = config.admin_key.as_deref().unwrap_or_default();
                match documents::upload(&backend, &mut library, file, key).await {
                    Ok(record) => println!(
                        "Uploaded {} ({} chunks indexed)",
                        record.filename, record.chunks_indexed
                    ),
                    Err(e) => eprintln!("⚠ {}", e.user_message()),
                }
            }
            Command::Delete(name) => {
                let document = DocumentRef::new(name);
                match documents::delete(&backend, &mut library, &document).await {
                    Ok(()) => println!("Deleted {document}"),
                    Err(e) => eprintln!("⚠ {}", e.user_message()),
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Unknown(input) => println!("Unknown command {input}, try /help"),
        }
    }

    Ok(())
}
