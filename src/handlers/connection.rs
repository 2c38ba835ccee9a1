//! Connection and registration handlers.
//!
//! Handles NICK, PING, QUIT commands.

use super::{SERVER_NAME, server_reply};
use crate::line::Line;
use crate::session::ClientSession;
use sldispatch_core::{Command, CommandError, CommandResult, Session};
use tracing::info;

/// Validates a nickname: a letter or one of `[]\`^{}|_` first, then
/// letters, digits, `-` or the same specials, at most 30 bytes.
fn is_valid_nick(nick: &str) -> bool {
    if nick.len() > 30 {
        return false;
    }

    let special = |c: char| matches!(c, '[' | ']' | '\\' | '`' | '^' | '{' | '}' | '|' | '_');
    let mut chars = nick.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || special(first) => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || special(c))
}

/// Handler for NICK command. The first valid NICK registers the session.
pub struct NickHandler;

impl Command<ClientSession, Line> for NickHandler {
    fn key(&self) -> String {
        "NICK".to_string()
    }

    fn execute(&self, session: &ClientSession, line: &Line) -> CommandResult {
        // NICK <nickname>
        let Some(nick) = line.param(0).filter(|n| !n.is_empty()) else {
            session.send(server_reply("431", &session.nick_or_star(), "No nickname given"));
            return Err(CommandError::InvalidInput("NICK requires a nickname".into()));
        };

        if !is_valid_nick(nick) {
            session.send(server_reply(
                "432",
                &format!("{} {nick}", session.nick_or_star()),
                "Erroneous nickname",
            ));
            return Err(CommandError::InvalidInput(format!("invalid nickname '{nick}'")));
        }

        match session.register(nick) {
            None => {
                info!(session = %session.session_id(), nick = %nick, "Client registered");
                session.send(server_reply("001", nick, &format!("Welcome, {nick}")));
            }
            Some(old) => {
                session.send(format!(":{old} NICK {nick}"));
            }
        }

        Ok(())
    }
}

/// Handler for PING command.
pub struct PingHandler;

impl Command<ClientSession, Line> for PingHandler {
    fn key(&self) -> String {
        "PING".to_string()
    }

    fn execute(&self, session: &ClientSession, line: &Line) -> CommandResult {
        // PING <token>
        let Some(token) = line.param(0) else {
            session.send(server_reply("409", &session.nick_or_star(), "No origin specified"));
            return Err(CommandError::InvalidInput("PING requires a token".into()));
        };

        session.send(format!(":{SERVER_NAME} PONG {SERVER_NAME} :{token}"));
        Ok(())
    }
}

/// Handler for QUIT command. Closes the session after the goodbye line.
pub struct QuitHandler;

impl Command<ClientSession, Line> for QuitHandler {
    fn key(&self) -> String {
        "QUIT".to_string()
    }

    fn execute(&self, session: &ClientSession, line: &Line) -> CommandResult {
        let reason = line.param(0).unwrap_or("Client quit");

        info!(
            session = %session.session_id(),
            nick = ?session.nick(),
            reason = %reason,
            "Client quit"
        );

        session.send(format!("ERROR :Closing link ({reason})"));
        session.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn nick_validation() {
        assert!(is_valid_nick("alice"));
        assert!(is_valid_nick("[bot]-2"));
        assert!(!is_valid_nick("2fast"));
        assert!(!is_valid_nick("-dash"));
        assert!(!is_valid_nick("has space"));
        assert!(!is_valid_nick(""));
        assert!(!is_valid_nick(&"a".repeat(31)));
    }

    #[test]
    fn first_nick_registers_and_welcomes() {
        let (session, mut rx) = ClientSession::new("c1");
        NickHandler.execute(&session, &Line::parse("NICK alice")).unwrap();

        assert!(session.is_registered());
        assert_eq!(drain(&mut rx), vec![":sldispatch 001 alice :Welcome, alice"]);
    }

    #[test]
    fn second_nick_announces_change() {
        let (session, mut rx) = ClientSession::new("c1");
        NickHandler.execute(&session, &Line::parse("NICK alice")).unwrap();
        NickHandler.execute(&session, &Line::parse("NICK bob")).unwrap();

        assert_eq!(drain(&mut rx).last().map(String::as_str), Some(":alice NICK bob"));
        assert_eq!(session.nick().as_deref(), Some("bob"));
    }

    #[test]
    fn missing_nick_is_invalid_input() {
        let (session, mut rx) = ClientSession::new("c1");
        let err = NickHandler.execute(&session, &Line::parse("NICK")).unwrap_err();

        assert!(matches!(err, CommandError::InvalidInput(_)));
        assert!(!session.is_registered());
        assert_eq!(drain(&mut rx), vec![":sldispatch 431 * :No nickname given"]);
    }

    #[test]
    fn erroneous_nick_is_rejected() {
        let (session, mut rx) = ClientSession::new("c1");
        let err = NickHandler.execute(&session, &Line::parse("NICK 9lives")).unwrap_err();

        assert_eq!(err.error_code(), "invalid_input");
        assert_eq!(drain(&mut rx), vec![":sldispatch 432 * 9lives :Erroneous nickname"]);
    }

    #[test]
    fn ping_echoes_token() {
        let (session, mut rx) = ClientSession::new("c1");
        PingHandler.execute(&session, &Line::parse("PING :abc 123")).unwrap();
        assert_eq!(drain(&mut rx), vec![":sldispatch PONG sldispatch :abc 123"]);
    }

    #[test]
    fn ping_without_token_fails() {
        let (session, _rx) = ClientSession::new("c1");
        assert!(PingHandler.execute(&session, &Line::parse("PING")).is_err());
    }

    #[test]
    fn quit_closes_session() {
        let (session, mut rx) = ClientSession::new("c1");
        QuitHandler.execute(&session, &Line::parse("QUIT :gone fishing")).unwrap();

        assert!(session.is_closed());
        assert_eq!(drain(&mut rx), vec!["ERROR :Closing link (gone fishing)"]);
    }
}
