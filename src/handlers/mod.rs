//! Command handlers and the registry they are built into.
//!
//! Handlers receive the parsed [`Line`] and reply through the session's
//! queue. [`build_registry`] wires them together with the stock filters
//! enabled in the config.

mod connection;
mod messaging;

pub use connection::{NickHandler, PingHandler, QuitHandler};
pub use messaging::EchoHandler;

use crate::config::FiltersConfig;
use crate::filters::{LoggingFilter, MetricsFilter, RequireRegistration};
use crate::line::Line;
use crate::session::ClientSession;
use sldispatch_core::{CommandRegistry, KeyComparer, Registration, RegistryError};

/// Name used as the prefix of server-originated replies.
pub const SERVER_NAME: &str = "sldispatch";

/// Format a server reply: `:<server> <code> <target> :<text>`.
pub fn server_reply(code: &str, target: &str, text: &str) -> String {
    format!(":{SERVER_NAME} {code} {target} :{text}")
}

/// Build the command registry.
///
/// NICK, PING and QUIT are open to everyone; ECHO requires registration when
/// that filter is enabled. Logging and metrics filters, when enabled, are
/// attached to every command.
pub fn build_registry<C>(
    filters: &FiltersConfig,
    comparer: C,
) -> Result<CommandRegistry<ClientSession, Line, C>, RegistryError>
where
    C: KeyComparer<String>,
{
    let mut echo = Registration::async_command(EchoHandler);
    if filters.registration.enabled {
        echo = echo.filter(filters.registration.order, RequireRegistration);
    }

    let mut builder = CommandRegistry::builder()
        .comparer(comparer)
        .register(Registration::command(NickHandler))
        .register(Registration::command(PingHandler))
        .register(Registration::command(QuitHandler))
        .register(echo);

    if filters.logging.enabled {
        builder = builder.global_filter(filters.logging.order, LoggingFilter);
    }
    if filters.metrics.enabled {
        builder = builder.global_filter(filters.metrics.order, MetricsFilter);
    }

    builder.build()
}
