//! Rejects commands from sessions that have not registered.

use crate::handlers::server_reply;
use crate::line::Line;
use crate::metrics;
use crate::session::ClientSession;
use sldispatch_core::{CommandFilter, ExecutionContext, FilterAction, Session};
use tracing::debug;

/// Cancels the command with `451` until the session has registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireRegistration;

impl CommandFilter<ClientSession, Line> for RequireRegistration {
    fn on_executing(&self, ctx: &mut ExecutionContext<'_, ClientSession, Line>) -> FilterAction {
        let session = ctx.session();
        if session.is_registered() {
            return FilterAction::Proceed;
        }

        let command = &ctx.package().command;
        debug!(session = %session.session_id(), command = %command, "Rejecting unregistered client");
        session.send(server_reply(
            "451",
            &format!("{} {command}", session.nick_or_star()),
            "You have not registered",
        ));
        // Registered key, not the wire casing.
        metrics::record_cancelled(ctx.command().key());
        FilterAction::Cancel
    }

    fn on_executed(&self, _ctx: &ExecutionContext<'_, ClientSession, Line>) {}
}
