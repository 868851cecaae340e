//! Contract keys used to index exports.

use std::any::{type_name, TypeId};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Type-level key naming the capability a caller asks for.
///
/// Contracts are open-ended: any `'static` type, including trait objects such
/// as `dyn Formatter`, can act as a contract.
#[derive(Debug, Clone, Copy)]
pub struct ContractKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl ContractKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Diagnostic type name; not guaranteed stable across compiler versions.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

// Identity is the TypeId alone; type_name is diagnostic only.
impl PartialEq for ContractKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ContractKey {}

impl Hash for ContractKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl Display for ContractKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
