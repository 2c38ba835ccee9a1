//! Command filters and the per-invocation execution context.
//!
//! ## Pipeline
//!
//! For a command with filters `F1..Fn` (ascending order):
//!
//! ```text
//! F1.on_executing ─▶ … ─▶ Fn.on_executing ─▶ handler ─▶ F1.on_executed ─▶ … ─▶ Fn.on_executed
//!        │                      │
//!        └──── Cancel ──────────┴──▶ done (handler and every on_executed skipped)
//! ```
//!
//! A handler error is captured into the context and handed to every
//! `on_executed`; it is not returned to the dispatcher.
//!
//! Hooks are infallible. A hook that panics unwinds through the pipeline and
//! the remaining hooks of that invocation do not run.

use crate::descriptor::CommandDescriptor;
use crate::error::CommandError;
use crate::package::Package;
use crate::session::Session;
use async_trait::async_trait;
use http::Extensions;
use std::sync::Arc;

/// Decision returned by a pre-execution hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    /// Run the next filter, then the handler.
    Proceed,
    /// Stop here: skip remaining pre-hooks, the handler, and all post-hooks.
    Cancel,
}

impl FilterAction {
    /// Whether this action cancels the invocation.
    #[inline]
    pub const fn is_cancel(self) -> bool {
        matches!(self, Self::Cancel)
    }
}

/// Per-invocation state shared by a command's filters.
///
/// Created fresh for each invocation of a command that has filters, and
/// dropped when it completes.
pub struct ExecutionContext<'a, S: ?Sized + Session, P: Package> {
    session: &'a S,
    package: &'a P,
    command: &'a CommandDescriptor<S, P>,
    error: Option<CommandError>,
    extensions: Extensions,
}

impl<'a, S: ?Sized + Session, P: Package> ExecutionContext<'a, S, P> {
    pub(crate) fn new(session: &'a S, package: &'a P, command: &'a CommandDescriptor<S, P>) -> Self {
        Self {
            session,
            package,
            command,
            error: None,
            extensions: Extensions::new(),
        }
    }

    /// Session the package arrived on.
    #[inline]
    pub fn session(&self) -> &'a S {
        self.session
    }

    /// Package being handled.
    #[inline]
    pub fn package(&self) -> &'a P {
        self.package
    }

    /// Command being executed.
    #[inline]
    pub fn command(&self) -> &'a CommandDescriptor<S, P> {
        self.command
    }

    /// Error raised by the handler, once it has run.
    #[inline]
    pub fn error(&self) -> Option<&CommandError> {
        self.error.as_ref()
    }

    pub(crate) fn set_error(&mut self, error: CommandError) {
        self.error = Some(error);
    }

    /// Values filters stored for this invocation.
    #[inline]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to per-invocation values.
    #[inline]
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

/// Synchronous interceptor around a command.
pub trait CommandFilter<S: ?Sized + Session, P: Package>: Send + Sync {
    /// Runs before the handler. Return [`FilterAction::Cancel`] to stop the
    /// invocation.
    fn on_executing(&self, ctx: &mut ExecutionContext<'_, S, P>) -> FilterAction;

    /// Runs after the handler, whether or not it failed.
    fn on_executed(&self, ctx: &ExecutionContext<'_, S, P>);
}

/// Interceptor whose hooks may suspend.
#[async_trait]
pub trait AsyncCommandFilter<S: ?Sized + Session, P: Package>: Send + Sync {
    /// Runs before the handler. Return [`FilterAction::Cancel`] to stop the
    /// invocation.
    async fn on_executing(&self, ctx: &mut ExecutionContext<'_, S, P>) -> FilterAction;

    /// Runs after the handler, whether or not it failed.
    async fn on_executed(&self, ctx: &ExecutionContext<'_, S, P>);
}

/// A filter of either capability.
pub enum Filter<S: ?Sized + Session, P: Package> {
    /// Hooks run inline.
    Sync(Arc<dyn CommandFilter<S, P>>),
    /// Hooks are awaited.
    Async(Arc<dyn AsyncCommandFilter<S, P>>),
}

impl<S: ?Sized + Session, P: Package> Clone for Filter<S, P> {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(f) => Self::Sync(Arc::clone(f)),
            Self::Async(f) => Self::Async(Arc::clone(f)),
        }
    }
}

impl<S: ?Sized + Session, P: Package> Filter<S, P> {
    pub(crate) async fn on_executing(&self, ctx: &mut ExecutionContext<'_, S, P>) -> FilterAction {
        match self {
            Self::Sync(f) => f.on_executing(ctx),
            Self::Async(f) => f.on_executing(ctx).await,
        }
    }

    pub(crate) async fn on_executed(&self, ctx: &ExecutionContext<'_, S, P>) {
        match self {
            Self::Sync(f) => f.on_executed(ctx),
            Self::Async(f) => f.on_executed(ctx).await,
        }
    }
}

/// A filter with its explicit order. Lower orders run first.
pub(crate) struct OrderedFilter<S: ?Sized + Session, P: Package> {
    pub(crate) order: i32,
    pub(crate) filter: Filter<S, P>,
}

impl<S: ?Sized + Session, P: Package> Clone for OrderedFilter<S, P> {
    fn clone(&self) -> Self {
        Self {
            order: self.order,
            filter: self.filter.clone(),
        }
    }
}

/// Stable ascending sort by order; equal orders keep their input order.
pub(crate) fn sort_filters<S: ?Sized + Session, P: Package>(filters: &mut [OrderedFilter<S, P>]) {
    filters.sort_by_key(|f| f.order);
}
