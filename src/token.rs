//! Type identity tokens used as registry keys.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identity of a declared type.
///
/// Two tokens are equal when they were created for the same type. The type
/// name is kept for messages only and takes no part in comparison.
#[derive(Clone, Copy, Debug)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Token for the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type name, as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check if this token identifies `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
