use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rca_bot::domain::{ConversationTurn, KnowledgeBaseHandle, Role};
use rca_bot::services::TurnReply;

pub fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn print_turn(turn: &ConversationTurn) {
    let label = match turn.role() {
        Role::Assistant => style(turn.role().to_string()).cyan().bold(),
        Role::User => style(turn.role().to_string()).green().bold(),
    };
    println!("{label}: {}", turn.text());
}

pub fn print_transcript(turns: &[ConversationTurn]) {
    for turn in turns {
        print_turn(turn);
    }
}

pub fn print_reply(reply: &TurnReply) {
    println!("{}: {}", style("AI").cyan().bold(), reply.answer);
    if reply.retrieval.is_empty() {
        return;
    }

    println!(
        "{}",
        style(format!("    searched: \"{}\"", reply.retrieval.query)).dim()
    );
    for scored in &reply.retrieval.chunks {
        println!(
            "{}",
            style(format!(
                "    [{}] {} (score: {:.2})",
                scored.chunk.position, scored.chunk.source_url, scored.score
            ))
            .dim()
        );
    }
}

pub fn print_indexed(handle: &KnowledgeBaseHandle) {
    let manifest = handle.manifest();
    println!(
        "{} Indexed {} chunks from {} into {}",
        style("✓").green(),
        manifest.record_count,
        manifest.source_url,
        handle.location().display()
    );
}

pub fn print_notice(message: &str) {
    println!("{}", style(message).yellow());
}
