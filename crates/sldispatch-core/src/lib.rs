//! # sldispatch-core
//!
//! Command dispatch for session-oriented protocol servers.
//!
//! A decoded package arriving on a session is mapped to a domain package,
//! routed by its key to a registered command, and executed through the
//! command's ordered filter pipeline.
//!
//! ## Building Blocks
//!
//! - [`Session`]: the per-peer handle. `dyn Session` is the base capability;
//!   servers may narrow dispatch to a concrete session type.
//! - [`Package`] / [`RoutingKey`]: the domain package and the key it routes on.
//! - [`Command`], [`AsyncCommand`], [`ShortCommand`], [`AsyncShortCommand`]:
//!   the handler shapes a registry accepts.
//! - [`CommandFilter`] / [`AsyncCommandFilter`]: interceptors with a
//!   cancelling pre-hook and an observing post-hook.
//! - [`CommandRegistry`]: immutable key to [`CommandDescriptor`] map, built
//!   once at startup by [`RegistryBuilder`].
//! - [`Dispatcher`]: maps a transport package and drives its descriptor.
//!
//! ## Quick Start
//!
//! ```rust
//! use sldispatch_core::{
//!     Command, CommandRegistry, CommandResult, Dispatcher, Package, Registration, Session,
//! };
//!
//! struct Peer;
//! impl Session for Peer {
//!     fn session_id(&self) -> &str {
//!         "peer-1"
//!     }
//! }
//!
//! #[derive(Clone)]
//! struct Text {
//!     key: String,
//! }
//! impl Package for Text {
//!     type Key = String;
//!     fn key(&self) -> &String {
//!         &self.key
//!     }
//! }
//!
//! struct Ping;
//! impl Command<dyn Session, Text> for Ping {
//!     fn key(&self) -> String {
//!         "PING".to_string()
//!     }
//!     fn execute(&self, _session: &dyn Session, _package: &Text) -> CommandResult {
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = CommandRegistry::<dyn Session, Text>::builder()
//!     .register(Registration::command(Ping))
//!     .build()?;
//! let dispatcher = Dispatcher::identity(registry);
//! dispatcher
//!     .dispatch(&Peer, &Text { key: "PING".to_string() })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod package;
pub mod registry;
pub mod session;

pub use command::{AsyncCommand, AsyncShortCommand, Command, CommandHandler, ShortCommand};
pub use descriptor::CommandDescriptor;
pub use dispatcher::Dispatcher;
pub use error::{CommandError, CommandResult, RegistryError};
pub use filter::{AsyncCommandFilter, CommandFilter, ExecutionContext, Filter, FilterAction};
pub use package::{
    AsciiCaseInsensitive, Exact, IdentityMapper, KeyComparer, Package, PackageMapper, RoutingKey,
};
pub use registry::{CommandRegistry, Registration, RegistryBuilder};
pub use session::{Session, is_base_session};
