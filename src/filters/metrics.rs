//! Records Prometheus metrics around each command.

use crate::metrics;
use sldispatch_core::{CommandFilter, ExecutionContext, FilterAction, Package, Session};
use std::time::Instant;

/// Start time stashed in the context extensions by the pre-hook.
#[derive(Debug, Clone, Copy)]
struct CommandStart(Instant);

/// Counts executions and failures and observes latency, labelled by key.
///
/// Latency covers everything between this filter's pre-hook and post-hook,
/// so attach it with a low order to time the inner filters too.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsFilter;

impl<S, P> CommandFilter<S, P> for MetricsFilter
where
    S: ?Sized + Session,
    P: Package,
    P::Key: AsRef<str>,
{
    fn on_executing(&self, ctx: &mut ExecutionContext<'_, S, P>) -> FilterAction {
        ctx.extensions_mut().insert(CommandStart(Instant::now()));
        FilterAction::Proceed
    }

    fn on_executed(&self, ctx: &ExecutionContext<'_, S, P>) {
        let label: &str = ctx.command().key().as_ref();
        let elapsed = ctx
            .extensions()
            .get::<CommandStart>()
            .map(|start| start.0.elapsed().as_secs_f64())
            .unwrap_or_default();

        metrics::record_command(label, elapsed);
        if let Some(e) = ctx.error() {
            metrics::record_command_error(label, e.error_code());
        }
    }
}
