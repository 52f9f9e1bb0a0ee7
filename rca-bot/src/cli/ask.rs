use rca_bot::Result;
use rca_bot::config::Config;
use rca_bot::domain::SessionState;
use rca_bot::services::LiveController;

use super::render;

pub async fn run(config: &Config, question: &str, json: bool) -> Result<()> {
    let controller = LiveController::from_config(config)?;
    let mut session = SessionState::new();

    let Some(reply) = controller.send_message(&mut session, question).await? else {
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        render::print_reply(&reply);
    }
    Ok(())
}
