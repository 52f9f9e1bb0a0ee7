use std::io::Write as _;

use rca_bot::Result;
use rca_bot::config::Config;
use rca_bot::domain::SessionState;
use rca_bot::services::{LiveController, SessionEvent, SessionOutcome, render_transcript};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::render;

const HELP: &str = "Commands: /url <URL> sets the knowledge base URL, /process processes it, \
                    /history shows the conversation, /quit exits. Anything else is a question.";

#[derive(Debug, PartialEq, Eq)]
enum ChatCommand {
    SetUrl(String),
    Process(Option<String>),
    History,
    Help,
    Quit,
    Message(String),
    Unknown(String),
    Empty,
}

fn parse_line(line: &str) -> ChatCommand {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatCommand::Message(line.to_string());
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));
    let arg = (!arg.is_empty()).then(|| arg.to_string());

    match (name, arg) {
        ("url", Some(url)) => ChatCommand::SetUrl(url),
        ("process", arg) => ChatCommand::Process(arg),
        ("history", None) => ChatCommand::History,
        ("help", None) => ChatCommand::Help,
        ("quit" | "exit", None) => ChatCommand::Quit,
        _ => ChatCommand::Unknown(line.to_string()),
    }
}

pub async fn run(config: &Config, url: Option<String>, json: bool) -> Result<()> {
    let controller = LiveController::from_config(config)?;
    let mut session = SessionState::new();
    let mut knowledge_base_url = url;

    if !json {
        println!("{}", console::style("RCA BOT").bold().underlined());
        render::print_transcript(session.transcript());
        if knowledge_base_url.is_none() {
            render::print_notice("Add a URL to Process New Data (/url <URL>, then /process)");
        }
    }

    if let Some(url) = knowledge_base_url.clone() {
        dispatch(&controller, &mut session, SessionEvent::ProcessUrl(url), json).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !json {
            print!("{} ", console::style(">").bold());
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            ChatCommand::Empty => {}
            ChatCommand::Quit => break,
            ChatCommand::Help => notice(HELP, json),
            ChatCommand::History if json => print_json(&json!({
                "event": "history",
                "transcript": render_transcript(session.transcript()),
            })),
            ChatCommand::History => render::print_transcript(session.transcript()),
            ChatCommand::SetUrl(url) => knowledge_base_url = Some(url),
            ChatCommand::Process(arg) => {
                if arg.is_some() {
                    knowledge_base_url = arg;
                }
                match knowledge_base_url.clone() {
                    Some(url) => {
                        dispatch(&controller, &mut session, SessionEvent::ProcessUrl(url), json)
                            .await;
                    }
                    None => notice("Add a URL to Process New Data", json),
                }
            }
            ChatCommand::Message(text) => {
                dispatch(&controller, &mut session, SessionEvent::Message(text), json).await;
            }
            ChatCommand::Unknown(input) => {
                notice(&format!("Unknown command: {input}"), json);
                notice(HELP, json);
            }
        }
    }

    Ok(())
}

/// Runs one action. Failures are reported and the session carries on.
async fn dispatch(
    controller: &LiveController,
    session: &mut SessionState,
    event: SessionEvent,
    json: bool,
) {
    let spinner = match (&event, json) {
        (SessionEvent::ProcessUrl(url), false) => Some(render::spinner(format!("Processing {url}"))),
        (SessionEvent::Message(_), false) => Some(render::spinner("Thinking".to_string())),
        (_, true) => None,
    };
    let result = controller.handle(session, event).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match (result, json) {
        (Ok(SessionOutcome::Indexed(handle)), false) => render::print_indexed(&handle),
        (Ok(SessionOutcome::Replied(reply)), false) => render::print_reply(&reply),
        (Ok(SessionOutcome::Indexed(handle)), true) => print_json(&json!({
            "event": "indexed",
            "location": handle.location(),
            "records": handle.len(),
        })),
        (Ok(SessionOutcome::Replied(reply)), true) => print_json(&json!({
            "event": "reply",
            "answer": reply.answer,
            "query": reply.retrieval.query,
            "chunks": reply.retrieval.chunks,
        })),
        (Ok(SessionOutcome::Ignored), _) => {}
        (Err(e), false) => eprintln!("{} {e}", console::style("error:").red().bold()),
        (Err(e), true) => print_json(&json!({ "event": "error", "message": e.to_string() })),
    }
}

fn notice(message: &str, json: bool) {
    if json {
        print_json(&notice_event(message));
    } else {
        render::print_notice(message);
    }
}

fn notice_event(message: &str) -> serde_json::Value {
    json!({ "event": "notice", "message": message })
}

fn print_json(value: &serde_json::Value) {
    println!("{value}");
}
