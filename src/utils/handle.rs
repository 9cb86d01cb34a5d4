use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;

pub type HandleIndex = u32;

/// An index into some arena, tagged with the version of the slot it was created
/// with. Both halves are packed into one word, index in the upper half, so handles
/// order by index first.
///
/// Versions are odd while the slot is alive. A handle with an even version never
/// refers to anything.
#[derive(
    Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Handle(u64);

impl Handle {
    #[inline]
    pub fn new(index: HandleIndex, version: HandleIndex) -> Self {
        Handle((u64::from(index) << 32) | u64::from(version))
    }

    #[inline]
    pub fn nil() -> Self {
        Handle(0)
    }

    /// Returns true if this handle could refer to an alive slot.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.version() & 0x1 == 1
    }

    #[inline]
    pub fn index(self) -> HandleIndex {
        (self.0 >> 32) as HandleIndex
    }

    #[inline]
    pub fn version(self) -> HandleIndex {
        self.0 as HandleIndex
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index(), self.version())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.index(), self.version())
    }
}

/// Anything that `HandlePool` could hand out.
pub trait HandleLike: Debug + Copy + Hash + Eq + Send + Sync {
    fn new(index: HandleIndex, version: HandleIndex) -> Self;
    fn index(&self) -> HandleIndex;
    fn version(&self) -> HandleIndex;
}

impl HandleLike for Handle {
    #[inline]
    fn new(index: HandleIndex, version: HandleIndex) -> Self {
        Handle::new(index, version)
    }

    #[inline]
    fn index(&self) -> HandleIndex {
        Handle::index(*self)
    }

    #[inline]
    fn version(&self) -> HandleIndex {
        Handle::version(*self)
    }
}

/// Declares a new handle type, so a `NodeHandle` could never be mistaken for a
/// `TextureHandle`.
#[macro_export]
macro_rules! impl_handle {
    ($name:ident) => {
        #[derive(
            Debug,
            Default,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
        )]
        pub struct $name($crate::utils::handle::Handle);

        impl $name {
            #[inline]
            pub fn index(self) -> $crate::utils::handle::HandleIndex {
                self.0.index()
            }

            #[inline]
            pub fn version(self) -> $crate::utils::handle::HandleIndex {
                self.0.version()
            }
        }

        impl From<$crate::utils::handle::Handle> for $name {
            fn from(handle: $crate::utils::handle::Handle) -> Self {
                $name(handle)
            }
        }

        impl From<$name> for $crate::utils::handle::Handle {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }

        impl $crate::utils::handle::HandleLike for $name {
            fn new(
                index: $crate::utils::handle::HandleIndex,
                version: $crate::utils::handle::HandleIndex,
            ) -> Self {
                $name($crate::utils::handle::Handle::new(index, version))
            }

            fn index(&self) -> $crate::utils::handle::HandleIndex {
                self.0.index()
            }

            fn version(&self) -> $crate::utils::handle::HandleIndex {
                self.0.version()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}{}", stringify!($name), self.0)
            }
        }
    };
}
