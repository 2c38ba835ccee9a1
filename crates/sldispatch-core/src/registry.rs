//! Command registry construction and lookup.
//!
//! The registry is built once at startup from explicit [`Registration`]s and
//! is read-only afterwards, so concurrent dispatches share it without locks.
//!
//! ## Build Rules
//!
//! 1. Full-shape registrations ([`Command`], [`AsyncCommand`]) are always
//!    selected.
//! 2. Short-shape registrations ([`ShortCommand`], [`AsyncShortCommand`]) are
//!    selected only when the registry dispatches on `dyn Session`. With a
//!    custom session type they are skipped.
//! 3. Each selected registration is constructed, its key checked, and its
//!    filters (own filters, then global filters) stably sorted by order.
//! 4. Keys are compared through the registry's [`KeyComparer`]; a collision
//!    fails the build.

use crate::command::{
    AsyncCommand, AsyncShort, AsyncShortCommand, Command, CommandHandler, Short, ShortCommand,
};
use crate::descriptor::CommandDescriptor;
use crate::error::RegistryError;
use crate::filter::{AsyncCommandFilter, CommandFilter, Filter, OrderedFilter, sort_filters};
use crate::package::{Exact, KeyComparer, Package, RoutingKey};
use crate::session::{Session, is_base_session};
use std::any::type_name;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::{debug, info};

type Factory<S, P> = Box<dyn FnOnce() -> anyhow::Result<CommandHandler<S, P>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Full,
    Short,
}

/// One candidate handler with the filters attached to it.
pub struct Registration<S: ?Sized + Session, P: Package> {
    name: &'static str,
    shape: Shape,
    factory: Factory<S, P>,
    filters: Vec<OrderedFilter<S, P>>,
}

impl<S: ?Sized + Session, P: Package> Registration<S, P> {
    fn new(name: &'static str, shape: Shape, factory: Factory<S, P>) -> Self {
        Self {
            name,
            shape,
            factory,
            filters: Vec::new(),
        }
    }

    /// Register a synchronous handler.
    pub fn command<C: Command<S, P> + 'static>(cmd: C) -> Self {
        Self::command_with(move || Ok(cmd))
    }

    /// Register a synchronous handler produced by `factory` at build time.
    pub fn command_with<C, F>(factory: F) -> Self
    where
        C: Command<S, P> + 'static,
        F: FnOnce() -> anyhow::Result<C> + 'static,
    {
        Self::new(
            type_name::<C>(),
            Shape::Full,
            Box::new(move || -> anyhow::Result<CommandHandler<S, P>> {
                Ok(CommandHandler::Sync(Box::new(factory()?)))
            }),
        )
    }

    /// Register a suspending handler.
    pub fn async_command<C: AsyncCommand<S, P> + 'static>(cmd: C) -> Self {
        Self::async_command_with(move || Ok(cmd))
    }

    /// Register a suspending handler produced by `factory` at build time.
    pub fn async_command_with<C, F>(factory: F) -> Self
    where
        C: AsyncCommand<S, P> + 'static,
        F: FnOnce() -> anyhow::Result<C> + 'static,
    {
        Self::new(
            type_name::<C>(),
            Shape::Full,
            Box::new(move || -> anyhow::Result<CommandHandler<S, P>> {
                Ok(CommandHandler::Async(Box::new(factory()?)))
            }),
        )
    }

    /// Register a synchronous handler that ignores the session.
    pub fn short<C: ShortCommand<P> + 'static>(cmd: C) -> Self {
        Self::short_with(move || Ok(cmd))
    }

    /// Register a session-less synchronous handler produced by `factory`.
    pub fn short_with<C, F>(factory: F) -> Self
    where
        C: ShortCommand<P> + 'static,
        F: FnOnce() -> anyhow::Result<C> + 'static,
    {
        Self::new(
            type_name::<C>(),
            Shape::Short,
            Box::new(move || -> anyhow::Result<CommandHandler<S, P>> {
                Ok(CommandHandler::Sync(Box::new(Short(factory()?))))
            }),
        )
    }

    /// Register a suspending handler that ignores the session.
    pub fn async_short<C: AsyncShortCommand<P> + 'static>(cmd: C) -> Self {
        Self::async_short_with(move || Ok(cmd))
    }

    /// Register a session-less suspending handler produced by `factory`.
    pub fn async_short_with<C, F>(factory: F) -> Self
    where
        C: AsyncShortCommand<P> + 'static,
        F: FnOnce() -> anyhow::Result<C> + 'static,
    {
        Self::new(
            type_name::<C>(),
            Shape::Short,
            Box::new(move || -> anyhow::Result<CommandHandler<S, P>> {
                Ok(CommandHandler::Async(Box::new(AsyncShort(factory()?))))
            }),
        )
    }

    /// Attach a synchronous filter.
    pub fn filter(self, order: i32, filter: impl CommandFilter<S, P> + 'static) -> Self {
        self.with_filter(order, Filter::Sync(Arc::new(filter)))
    }

    /// Attach a filter whose hooks may suspend.
    pub fn async_filter(self, order: i32, filter: impl AsyncCommandFilter<S, P> + 'static) -> Self {
        self.with_filter(order, Filter::Async(Arc::new(filter)))
    }

    /// Attach an already shared filter.
    pub fn with_filter(mut self, order: i32, filter: Filter<S, P>) -> Self {
        self.filters.push(OrderedFilter { order, filter });
        self
    }

    /// Type name of the handler.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Collects registrations and builds a [`CommandRegistry`].
pub struct RegistryBuilder<S: ?Sized + Session, P: Package, C = Exact> {
    registrations: Vec<Registration<S, P>>,
    global_filters: Vec<OrderedFilter<S, P>>,
    comparer: C,
}

impl<S: ?Sized + Session, P: Package> RegistryBuilder<S, P> {
    /// Empty builder using natural key equality.
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            global_filters: Vec::new(),
            comparer: Exact,
        }
    }
}

impl<S: ?Sized + Session, P: Package> Default for RegistryBuilder<S, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized + Session, P: Package, C: KeyComparer<P::Key>> RegistryBuilder<S, P, C> {
    /// Compare keys with `comparer` instead.
    pub fn comparer<C2: KeyComparer<P::Key>>(self, comparer: C2) -> RegistryBuilder<S, P, C2> {
        RegistryBuilder {
            registrations: self.registrations,
            global_filters: self.global_filters,
            comparer,
        }
    }

    /// Add one candidate.
    pub fn register(mut self, registration: Registration<S, P>) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Add candidates in order.
    pub fn register_all(mut self, registrations: impl IntoIterator<Item = Registration<S, P>>) -> Self {
        self.registrations.extend(registrations);
        self
    }

    /// Attach a synchronous filter to every command.
    pub fn global_filter(self, order: i32, filter: impl CommandFilter<S, P> + 'static) -> Self {
        self.global_with_filter(order, Filter::Sync(Arc::new(filter)))
    }

    /// Attach a suspending filter to every command.
    pub fn global_async_filter(
        self,
        order: i32,
        filter: impl AsyncCommandFilter<S, P> + 'static,
    ) -> Self {
        self.global_with_filter(order, Filter::Async(Arc::new(filter)))
    }

    /// Attach an already shared filter to every command.
    pub fn global_with_filter(mut self, order: i32, filter: Filter<S, P>) -> Self {
        self.global_filters.push(OrderedFilter { order, filter });
        self
    }

    /// Build the registry.
    ///
    /// Runs every selected factory. Fails on the first construction error,
    /// unusable key or duplicate key.
    pub fn build(self) -> Result<CommandRegistry<S, P, C>, RegistryError> {
        let Self {
            registrations,
            global_filters,
            comparer,
        } = self;

        let accept_short = is_base_session::<S>();
        let mut commands: HashMap<P::Key, CommandDescriptor<S, P>> =
            HashMap::with_capacity(registrations.len());

        for registration in registrations {
            let Registration {
                name,
                shape,
                factory,
                mut filters,
            } = registration;

            if shape == Shape::Short && !accept_short {
                debug!(command = name, "Skipping short command: custom session type");
                continue;
            }

            let handler = factory().map_err(|source| RegistryError::Construct {
                command: name,
                source,
            })?;

            let key = handler.key();
            if !key.is_usable() {
                return Err(RegistryError::UnusableKey {
                    command: name,
                    key: format!("{key:?}"),
                });
            }

            match commands.entry(comparer.canonicalize(&key).into_owned()) {
                Entry::Occupied(existing) => {
                    return Err(RegistryError::DuplicateKey {
                        key: format!("{:?}", existing.key()),
                        first: existing.get().name(),
                        second: name,
                    });
                }
                Entry::Vacant(slot) => {
                    filters.extend(global_filters.iter().cloned());
                    sort_filters(&mut filters);
                    debug!(command = name, key = ?key, filters = filters.len(), "Registered command");
                    slot.insert(CommandDescriptor::new(key, name, handler, filters));
                }
            }
        }

        info!(commands = commands.len(), "Command registry built");
        Ok(CommandRegistry { commands, comparer })
    }
}

/// Immutable map from routing key to command descriptor.
pub struct CommandRegistry<S: ?Sized + Session, P: Package, C = Exact> {
    commands: HashMap<P::Key, CommandDescriptor<S, P>>,
    comparer: C,
}

impl<S: ?Sized + Session, P: Package> CommandRegistry<S, P> {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder<S, P> {
        RegistryBuilder::new()
    }
}

impl<S: ?Sized + Session, P: Package, C: KeyComparer<P::Key>> CommandRegistry<S, P, C> {
    /// Descriptor registered for `key`, compared through the registry comparer.
    #[inline]
    pub fn get(&self, key: &P::Key) -> Option<&CommandDescriptor<S, P>> {
        self.commands.get(self.comparer.canonicalize(key).as_ref())
    }

    /// Whether a command is registered for `key`.
    #[inline]
    pub fn contains(&self, key: &P::Key) -> bool {
        self.get(key).is_some()
    }

    /// Number of registered commands.
    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Canonical keys of all registered commands.
    pub fn keys(&self) -> impl Iterator<Item = &P::Key> {
        self.commands.keys()
    }

    /// All descriptors with their canonical keys.
    pub fn iter(&self) -> impl Iterator<Item = (&P::Key, &CommandDescriptor<S, P>)> {
        self.commands.iter()
    }

    /// Command usage, most used first. Commands never executed are omitted.
    pub fn command_stats(&self) -> Vec<(&P::Key, u64)> {
        let mut stats: Vec<_> = self
            .commands
            .iter()
            .map(|(key, desc)| (key, desc.invocations()))
            .filter(|(_, count)| *count > 0)
            .collect();

        stats.sort_by(|a, b| b.1.cmp(&a.1));
        stats
    }
}

impl<S: ?Sized + Session, P: Package, C> std::fmt::Debug for CommandRegistry<S, P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandResult;
    use crate::filter::{ExecutionContext, FilterAction};
    use crate::package::AsciiCaseInsensitive;

    struct Custom;

    impl Session for Custom {
        fn session_id(&self) -> &str {
            "custom"
        }
    }

    struct Msg(String);

    impl Package for Msg {
        type Key = String;
        fn key(&self) -> &String {
            &self.0
        }
    }

    struct Named(&'static str);

    impl Command<dyn Session, Msg> for Named {
        fn key(&self) -> String {
            self.0.to_string()
        }

        fn execute(&self, _session: &dyn Session, _package: &Msg) -> CommandResult {
            Ok(())
        }
    }

    impl Command<Custom, Msg> for Named {
        fn key(&self) -> String {
            self.0.to_string()
        }

        fn execute(&self, _session: &Custom, _package: &Msg) -> CommandResult {
            Ok(())
        }
    }

    struct Bare(&'static str);

    impl ShortCommand<Msg> for Bare {
        fn key(&self) -> String {
            self.0.to_string()
        }

        fn execute(&self, _package: &Msg) -> CommandResult {
            Ok(())
        }
    }

    struct Noop;

    impl<S: ?Sized + Session> CommandFilter<S, Msg> for Noop {
        fn on_executing(&self, _ctx: &mut ExecutionContext<'_, S, Msg>) -> FilterAction {
            FilterAction::Proceed
        }

        fn on_executed(&self, _ctx: &ExecutionContext<'_, S, Msg>) {}
    }

    #[test]
    fn short_commands_register_on_base_session() {
        let registry = CommandRegistry::<dyn Session, Msg>::builder()
            .register(Registration::command(Named("JOIN")))
            .register(Registration::short(Bare("PART")))
            .build()
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&"PART".to_string()));
    }

    #[test]
    fn short_commands_are_skipped_on_custom_session() {
        let registry = CommandRegistry::<Custom, Msg>::builder()
            .register(Registration::command(Named("JOIN")))
            .register(Registration::short(Bare("PART")))
            .build()
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&"JOIN".to_string()));
        assert!(!registry.contains(&"PART".to_string()));
    }

    #[test]
    fn skipped_short_command_cannot_collide() {
        let registry = CommandRegistry::<Custom, Msg>::builder()
            .register(Registration::command(Named("JOIN")))
            .register(Registration::short(Bare("JOIN")))
            .build();
        assert!(registry.is_ok());
    }

    #[test]
    fn duplicate_keys_fail_the_build() {
        let err = CommandRegistry::<dyn Session, Msg>::builder()
            .register(Registration::command(Named("JOIN")))
            .register(Registration::short(Bare("JOIN")))
            .build()
            .unwrap_err();
        match err {
            RegistryError::DuplicateKey { first, second, .. } => {
                assert!(first.ends_with("Named"));
                assert!(second.ends_with("Bare"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn comparer_decides_duplicates() {
        let exact = CommandRegistry::<dyn Session, Msg>::builder()
            .register(Registration::command(Named("join")))
            .register(Registration::command(Named("JOIN")))
            .build();
        assert!(exact.is_ok());

        let folded = CommandRegistry::<dyn Session, Msg>::builder()
            .comparer(AsciiCaseInsensitive)
            .register(Registration::command(Named("join")))
            .register(Registration::command(Named("JOIN")))
            .build();
        assert!(matches!(folded, Err(RegistryError::DuplicateKey { .. })));
    }

    #[test]
    fn case_insensitive_lookup() {
        let registry = CommandRegistry::<dyn Session, Msg>::builder()
            .comparer(AsciiCaseInsensitive)
            .register(Registration::command(Named("Join")))
            .build()
            .unwrap();
        let desc = registry.get(&"jOiN".to_string()).unwrap();
        assert_eq!(desc.key(), "Join");
        assert_eq!(registry.keys().next().map(String::as_str), Some("JOIN"));
    }

    #[test]
    fn empty_key_is_unusable() {
        let err = CommandRegistry::<dyn Session, Msg>::builder()
            .register(Registration::command(Named("")))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnusableKey { .. }));
    }

    #[test]
    fn factory_failure_is_reported() {
        let err = CommandRegistry::<dyn Session, Msg>::builder()
            .register(Registration::command_with(|| -> anyhow::Result<Named> {
                anyhow::bail!("database unavailable")
            }))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::Construct { .. }));
        assert!(err.to_string().contains("database unavailable"));
    }

    #[test]
    fn skipped_factories_never_run() {
        let registry = CommandRegistry::<Custom, Msg>::builder()
            .register(Registration::short_with(|| -> anyhow::Result<Bare> {
                anyhow::bail!("must not run")
            }))
            .build()
            .unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn filters_sorted_with_globals_after_own_on_ties() {
        let registry = CommandRegistry::<dyn Session, Msg>::builder()
            .global_filter(2, Noop)
            .global_filter(0, Noop)
            .register(
                Registration::command(Named("JOIN"))
                    .filter(5, Noop)
                    .filter(2, Noop)
                    .filter(-1, Noop),
            )
            .build()
            .unwrap();
        let desc = registry.get(&"JOIN".to_string()).unwrap();
        assert_eq!(desc.filter_orders().collect::<Vec<_>>(), vec![-1, 0, 2, 2, 5]);
        assert_eq!(desc.filter_count(), 5);
    }
}
