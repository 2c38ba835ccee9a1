//! Dispatcher: the entry point called once per decoded inbound package.

use crate::descriptor::CommandDescriptor;
use crate::error::CommandResult;
use crate::package::{Exact, IdentityMapper, KeyComparer, Package, PackageMapper};
use crate::registry::CommandRegistry;
use crate::session::Session;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{Instrument, debug_span};

/// Routes transport packages to their commands.
///
/// Packages whose key has no registered command are dropped: `dispatch`
/// returns `Ok(())` and nothing is logged.
pub struct Dispatcher<R, M, S, C = Exact>
where
    R: ?Sized,
    M: PackageMapper<R>,
    S: ?Sized + Session,
{
    registry: Arc<CommandRegistry<S, M::Package, C>>,
    mapper: M,
    _raw: PhantomData<fn(&R)>,
}

impl<R, M, S, C> Dispatcher<R, M, S, C>
where
    R: ?Sized,
    M: PackageMapper<R>,
    S: ?Sized + Session,
    C: KeyComparer<<M::Package as Package>::Key>,
{
    /// Create a dispatcher over `registry`, mapping packages with `mapper`.
    pub fn new(registry: impl Into<Arc<CommandRegistry<S, M::Package, C>>>, mapper: M) -> Self {
        Self {
            registry: registry.into(),
            mapper,
            _raw: PhantomData,
        }
    }

    /// The registry this dispatcher routes through.
    #[inline]
    pub fn registry(&self) -> &Arc<CommandRegistry<S, M::Package, C>> {
        &self.registry
    }

    /// Descriptor a transport package would be routed to.
    pub fn route(&self, raw: &R) -> Option<&CommandDescriptor<S, M::Package>> {
        let package = self.mapper.map(raw);
        self.registry.get(package.key())
    }

    /// Map `raw` and execute the matching command.
    ///
    /// Returns the handler's error only when the command has no filters.
    pub async fn dispatch(&self, session: &S, raw: &R) -> CommandResult {
        let package = self.mapper.map(raw);
        self.dispatch_package(session, &package).await
    }

    /// Execute the command matching an already mapped package.
    pub async fn dispatch_package(&self, session: &S, package: &M::Package) -> CommandResult {
        let Some(command) = self.registry.get(package.key()) else {
            return Ok(());
        };

        let span = debug_span!(
            "command",
            key = ?package.key(),
            command = command.name(),
            session = session.session_id()
        );
        command.execute(session, package).instrument(span).await
    }
}

impl<P, S, C> Dispatcher<P, IdentityMapper, S, C>
where
    P: Package + Clone,
    S: ?Sized + Session,
    C: KeyComparer<P::Key>,
{
    /// Dispatcher for transports that already deliver domain packages.
    pub fn identity(registry: impl Into<Arc<CommandRegistry<S, P, C>>>) -> Self {
        Self::new(registry, IdentityMapper)
    }
}

impl<R, M, S, C> Clone for Dispatcher<R, M, S, C>
where
    R: ?Sized,
    M: PackageMapper<R> + Clone,
    S: ?Sized + Session,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            mapper: self.mapper.clone(),
            _raw: PhantomData,
        }
    }
}
