//! Command descriptor and the per-invocation execution engine.

use crate::command::CommandHandler;
use crate::error::CommandResult;
use crate::filter::{ExecutionContext, OrderedFilter};
use crate::package::Package;
use crate::session::Session;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// A registered command: its handler plus its ordered filters.
///
/// Built once by the registry and shared read-only by every dispatch.
pub struct CommandDescriptor<S: ?Sized + Session, P: Package> {
    key: P::Key,
    name: &'static str,
    handler: CommandHandler<S, P>,
    filters: Vec<OrderedFilter<S, P>>,
    /// Invocations that reached the handler.
    invocations: AtomicU64,
}

impl<S: ?Sized + Session, P: Package> CommandDescriptor<S, P> {
    pub(crate) fn new(
        key: P::Key,
        name: &'static str,
        handler: CommandHandler<S, P>,
        filters: Vec<OrderedFilter<S, P>>,
    ) -> Self {
        Self {
            key,
            name,
            handler,
            filters,
            invocations: AtomicU64::new(0),
        }
    }

    /// Key as reported by the handler.
    #[inline]
    pub fn key(&self) -> &P::Key {
        &self.key
    }

    /// Type name of the handler, for logs and metrics.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The resolved handler.
    #[inline]
    pub fn handler(&self) -> &CommandHandler<S, P> {
        &self.handler
    }

    /// Filter orders in execution order.
    pub fn filter_orders(&self) -> impl Iterator<Item = i32> + '_ {
        self.filters.iter().map(|f| f.order)
    }

    /// Number of attached filters.
    #[inline]
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Number of invocations that reached the handler so far.
    #[inline]
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Execute the command for one package.
    ///
    /// Without filters the handler's error is returned as is. With filters
    /// the error is captured for the post-hooks and this returns `Ok(())`.
    pub async fn execute(&self, session: &S, package: &P) -> CommandResult {
        if self.filters.is_empty() {
            self.invocations.fetch_add(1, Ordering::Relaxed);
            return self.handler.invoke(session, package).await;
        }

        let mut ctx = ExecutionContext::new(session, package, self);

        for ordered in &self.filters {
            if ordered.filter.on_executing(&mut ctx).await.is_cancel() {
                debug!(
                    command = self.name,
                    key = ?self.key,
                    order = ordered.order,
                    "Command cancelled by filter"
                );
                return Ok(());
            }
        }

        self.invocations.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.handler.invoke(session, package).await {
            ctx.set_error(e);
        }

        for ordered in &self.filters {
            ordered.filter.on_executed(&ctx).await;
        }

        Ok(())
    }
}

impl<S: ?Sized + Session, P: Package> std::fmt::Debug for CommandDescriptor<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("handler", &self.handler)
            .field("filters", &self.filters.len())
            .finish()
    }
}
