//! Runtime type system for the Sable runtime.
//!
//! - [`TypeRegistry`]: interned [`TypeDescriptor`]s and [`RelationEdge`]s,
//!   populated at startup and sealed by `linearize()` + `allocate()`
//! - [`c3_linearize`]: standalone C3 linearization over explicit base lists
//! - [`Instance`]: owned, type-sized data buffers
//! - conversion planning ([`Conversion`]) between related types
//! - [`DispatchTable`]: multimethod candidate selection

mod convert;
mod descriptor;
pub mod dispatch;
mod error;
mod flags;
mod idx;
mod instance;
mod layout;
mod linearize;
mod registry;

pub use convert::{Conversion, Indirection, IndirectionChange, Relation};
pub use descriptor::{
    Ancestor, Member, RelationEdge, RelationKind, TypeDescriptor, TypeKey, TypeKind,
};
pub use dispatch::{Arity, DispatchError, DispatchTable, ParamType, Signature};
pub use error::{LinearizationFailureReason, TypeError};
pub use flags::TypeFlags;
pub use idx::{EdgeId, TypeId};
pub use instance::Instance;
pub use layout::ResolvedMember;
pub use linearize::{c3_linearize, LinearizationError, Linearizer};
pub use registry::{Phase, TypeRegistry, POINTER_SIZE};
