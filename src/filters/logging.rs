//! Logs the outcome of every command.
//!
//! With any filter attached, a handler's error no longer reaches the caller
//! of `dispatch`. This filter is what makes those failures visible.

use sldispatch_core::{CommandFilter, ExecutionContext, FilterAction, Package, Session};
use tracing::{debug, warn};

/// Logs failures at `warn` and successes at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingFilter;

impl<S, P> CommandFilter<S, P> for LoggingFilter
where
    S: ?Sized + Session,
    P: Package,
{
    fn on_executing(&self, _ctx: &mut ExecutionContext<'_, S, P>) -> FilterAction {
        FilterAction::Proceed
    }

    fn on_executed(&self, ctx: &ExecutionContext<'_, S, P>) {
        let command = ctx.command();
        match ctx.error() {
            Some(e) => warn!(
                session = %ctx.session().session_id(),
                key = ?command.key(),
                command = command.name(),
                code = e.error_code(),
                error = %e,
                "Command failed"
            ),
            None => debug!(
                session = %ctx.session().session_id(),
                key = ?command.key(),
                "Command completed"
            ),
        }
    }
}
