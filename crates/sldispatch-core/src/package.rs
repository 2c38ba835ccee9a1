//! Domain packages, routing keys and key comparison.

use std::borrow::Cow;
use std::fmt::Debug;
use std::hash::Hash;

/// A value that selects a command.
pub trait RoutingKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Whether a handler may register under this key.
    fn is_usable(&self) -> bool {
        true
    }
}

impl RoutingKey for String {
    fn is_usable(&self) -> bool {
        !self.is_empty()
    }
}

impl RoutingKey for &'static str {
    fn is_usable(&self) -> bool {
        !self.is_empty()
    }
}

macro_rules! impl_routing_key {
    ($($ty:ty),* $(,)?) => {
        $(impl RoutingKey for $ty {})*
    };
}

impl_routing_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, char);

/// A decoded application message carrying exactly one routing key.
pub trait Package: Send + Sync {
    /// Key type the registry is indexed by.
    type Key: RoutingKey;

    /// The key this package routes on.
    fn key(&self) -> &Self::Key;
}

/// Equality used by a registry for its keys.
///
/// Two keys are equal when their canonical forms are equal. Both insertion
/// and lookup canonicalize, so the map only ever holds canonical keys.
pub trait KeyComparer<K: Clone>: Send + Sync + 'static {
    /// Canonical form of `key`.
    fn canonicalize<'k>(&self, key: &'k K) -> Cow<'k, K>;
}

/// Natural equality of the key type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

impl<K: Clone> KeyComparer<K> for Exact {
    #[inline]
    fn canonicalize<'k>(&self, key: &'k K) -> Cow<'k, K> {
        Cow::Borrowed(key)
    }
}

/// ASCII case-insensitive equality for string keys.
///
/// The canonical form is upper case, matching how command names appear on
/// the wire in most line protocols.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiCaseInsensitive;

impl KeyComparer<String> for AsciiCaseInsensitive {
    fn canonicalize<'k>(&self, key: &'k String) -> Cow<'k, String> {
        if key.bytes().any(|b| b.is_ascii_lowercase()) {
            Cow::Owned(key.to_ascii_uppercase())
        } else {
            Cow::Borrowed(key)
        }
    }
}

/// Converts a transport-level package into the domain package.
pub trait PackageMapper<R: ?Sized>: Send + Sync {
    /// Domain package produced by this mapper.
    type Package: Package;

    /// Map one transport package. Called once per incoming message.
    fn map(&self, raw: &R) -> Self::Package;
}

/// Mapper for transports whose package already is the domain package.
///
/// Clones every package. Call [`Dispatcher::dispatch_package`] directly to
/// avoid that.
///
/// [`Dispatcher::dispatch_package`]: crate::Dispatcher::dispatch_package
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl<P: Package + Clone> PackageMapper<P> for IdentityMapper {
    type Package = P;

    #[inline]
    fn map(&self, raw: &P) -> P {
        raw.clone()
    }
}
