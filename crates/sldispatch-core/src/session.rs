//! Session capability.

use std::any::TypeId;

/// One connected peer, as seen by command handlers.
///
/// The trait object `dyn Session` is the base capability every server
/// supports. A server that configures a concrete session type dispatches
/// with that type instead, which narrows which handler shapes it accepts
/// (see [`RegistryBuilder::build`]).
///
/// [`RegistryBuilder::build`]: crate::RegistryBuilder::build
pub trait Session: Send + Sync + 'static {
    /// Identifier used in logs and spans.
    fn session_id(&self) -> &str;
}

/// Whether `S` is the base session capability rather than a custom type.
#[inline]
pub fn is_base_session<S: ?Sized + 'static>() -> bool {
    TypeId::of::<S>() == TypeId::of::<dyn Session>()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Custom;

    impl Session for Custom {
        fn session_id(&self) -> &str {
            "custom"
        }
    }

    #[test]
    fn base_session_is_detected() {
        assert!(is_base_session::<dyn Session>());
        assert!(!is_base_session::<Custom>());
    }
}
