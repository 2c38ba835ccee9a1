//! Message handlers.

use super::SERVER_NAME;
use crate::line::Line;
use crate::session::ClientSession;
use async_trait::async_trait;
use sldispatch_core::{AsyncCommand, CommandError, CommandResult};

/// Handler for ECHO command.
///
/// Sends the text back to the sender. Registration is enforced by the
/// filter attached at registration time, not here.
pub struct EchoHandler;

#[async_trait]
impl AsyncCommand<ClientSession, Line> for EchoHandler {
    fn key(&self) -> String {
        "ECHO".to_string()
    }

    async fn execute(&self, session: &ClientSession, line: &Line) -> CommandResult {
        // ECHO <text...>
        if line.params.is_empty() {
            return Err(CommandError::InvalidInput("ECHO requires text".into()));
        }

        // Let other sessions run between decode and reply.
        tokio::task::yield_now().await;

        let text = line.params.join(" ");
        session.send(format!(":{SERVER_NAME} ECHO {} :{text}", session.nick_or_star()));
        Ok(())
    }
}
