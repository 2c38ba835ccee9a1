//! Command handler shapes.
//!
//! A registry accepts four shapes:
//!
//! - [`Command`]: synchronous, receives the session and the package.
//! - [`AsyncCommand`]: suspending, receives the session and the package.
//! - [`ShortCommand`] / [`AsyncShortCommand`]: the same without the session
//!   parameter. Only servers that dispatch on the base session capability
//!   accept these (see [`RegistryBuilder::build`]).
//!
//! Whichever shape a handler has, it is resolved once at registration into a
//! [`CommandHandler`], and the execution engine switches on that tag.
//!
//! [`RegistryBuilder::build`]: crate::RegistryBuilder::build

use crate::error::CommandResult;
use crate::package::Package;
use crate::session::Session;
use async_trait::async_trait;

/// Synchronous handler for one routing key.
///
/// # Example
///
/// ```ignore
/// pub struct PingCommand;
///
/// impl Command<ClientSession, Line> for PingCommand {
///     fn key(&self) -> String {
///         "PING".to_string()
///     }
///
///     fn execute(&self, session: &ClientSession, line: &Line) -> CommandResult {
///         let token = line.arg(0).ok_or_else(|| CommandError::InvalidInput("PING".into()))?;
///         session.reply(format!("PONG {token}"));
///         Ok(())
///     }
/// }
/// ```
pub trait Command<S: ?Sized + Session, P: Package>: Send + Sync {
    /// Key this handler is registered under.
    fn key(&self) -> P::Key;

    /// Handle one package.
    fn execute(&self, session: &S, package: &P) -> CommandResult;
}

/// Handler that may suspend while handling a package.
#[async_trait]
pub trait AsyncCommand<S: ?Sized + Session, P: Package>: Send + Sync {
    /// Key this handler is registered under.
    fn key(&self) -> P::Key;

    /// Handle one package.
    async fn execute(&self, session: &S, package: &P) -> CommandResult;
}

/// Synchronous handler that does not look at the session.
pub trait ShortCommand<P: Package>: Send + Sync {
    /// Key this handler is registered under.
    fn key(&self) -> P::Key;

    /// Handle one package.
    fn execute(&self, package: &P) -> CommandResult;
}

/// Suspending handler that does not look at the session.
#[async_trait]
pub trait AsyncShortCommand<P: Package>: Send + Sync {
    /// Key this handler is registered under.
    fn key(&self) -> P::Key;

    /// Handle one package.
    async fn execute(&self, package: &P) -> CommandResult;
}

/// Presents a [`ShortCommand`] as a [`Command`] by dropping the session.
pub(crate) struct Short<H>(pub(crate) H);

impl<S, P, H> Command<S, P> for Short<H>
where
    S: ?Sized + Session,
    P: Package,
    H: ShortCommand<P>,
{
    fn key(&self) -> P::Key {
        self.0.key()
    }

    fn execute(&self, _session: &S, package: &P) -> CommandResult {
        self.0.execute(package)
    }
}

/// Presents an [`AsyncShortCommand`] as an [`AsyncCommand`].
pub(crate) struct AsyncShort<H>(pub(crate) H);

#[async_trait]
impl<S, P, H> AsyncCommand<S, P> for AsyncShort<H>
where
    S: ?Sized + Session,
    P: Package,
    H: AsyncShortCommand<P>,
{
    fn key(&self) -> P::Key {
        self.0.key()
    }

    async fn execute(&self, _session: &S, package: &P) -> CommandResult {
        self.0.execute(package).await
    }
}

/// A resolved handler: exactly one of the synchronous or suspending variant.
pub enum CommandHandler<S: ?Sized + Session, P: Package> {
    /// Runs inline on the dispatching task.
    Sync(Box<dyn Command<S, P>>),
    /// Awaited on the dispatching task.
    Async(Box<dyn AsyncCommand<S, P>>),
}

impl<S: ?Sized + Session, P: Package> CommandHandler<S, P> {
    /// Key reported by the wrapped handler.
    pub fn key(&self) -> P::Key {
        match self {
            Self::Sync(cmd) => cmd.key(),
            Self::Async(cmd) => cmd.key(),
        }
    }

    /// Whether the handler may suspend.
    #[inline]
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    /// Run the handler. Suspends only if the handler itself does.
    pub async fn invoke(&self, session: &S, package: &P) -> CommandResult {
        match self {
            Self::Sync(cmd) => cmd.execute(session, package),
            Self::Async(cmd) => cmd.execute(session, package).await,
        }
    }
}

impl<S: ?Sized + Session, P: Package> std::fmt::Debug for CommandHandler<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("CommandHandler::Sync"),
            Self::Async(_) => f.write_str("CommandHandler::Async"),
        }
    }
}
