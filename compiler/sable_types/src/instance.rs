//! Owned, type-sized data buffers.

use std::fmt;

use sable_ir::Name;

use crate::registry::Phase;
use crate::{TypeError, TypeId, TypeRegistry};

/// A value of a registered data type: a descriptor plus a buffer of
/// exactly the descriptor's size.
///
/// `Clone` deep-copies the buffer. [`Instance::take`] moves the buffer out
/// and leaves the source empty.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Instance {
    ty: TypeId,
    bytes: Box<[u8]>,
}

impl Instance {
    /// Construct from raw data, copying it.
    ///
    /// The registry must be allocated and `raw` must match the type's size.
    pub fn new(registry: &TypeRegistry, ty: TypeId, raw: &[u8]) -> Result<Self, TypeError> {
        registry.require_at_least(Phase::Allocated, "construct an instance")?;
        let expected = registry.try_descriptor(ty)?.size();
        if raw.len() != expected {
            return Err(TypeError::SizeMismatch {
                ty: registry.type_label(ty),
                expected,
                got: raw.len(),
            });
        }
        Ok(Self {
            ty,
            bytes: raw.into(),
        })
    }

    /// A zero-filled instance of `ty`.
    pub fn zeroed(registry: &TypeRegistry, ty: TypeId) -> Result<Self, TypeError> {
        let size = registry.try_descriptor(ty)?.size();
        Self::new(registry, ty, &vec![0; size])
    }

    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether the buffer has been moved out.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Move the buffer into a new instance, leaving `self` empty.
    pub fn take(&mut self) -> Instance {
        Instance {
            ty: self.ty,
            bytes: std::mem::take(&mut self.bytes),
        }
    }

    /// Copy of the member `name`, typed by the member's declared type.
    pub fn read_member(&self, registry: &TypeRegistry, name: Name) -> Result<Instance, TypeError> {
        let member = registry.member(self.ty, name)?;
        let size = registry.size_of(member.ty);
        self.slice(registry, member.ty, member.offset, size)
    }

    /// Overwrite the member `name` with `value`, which must have the
    /// member's declared type.
    pub fn write_member(
        &mut self,
        registry: &TypeRegistry,
        name: Name,
        value: &Instance,
    ) -> Result<(), TypeError> {
        let member = registry.member(self.ty, name)?;
        if value.ty != member.ty {
            return Err(TypeError::TypeMismatch {
                from: registry.type_label(value.ty),
                to: registry.type_label(member.ty),
            });
        }
        let end = member.offset + value.bytes.len();
        match self.bytes.get_mut(member.offset..end) {
            Some(target) => {
                target.copy_from_slice(&value.bytes);
                Ok(())
            }
            None => Err(self.size_error(registry, end)),
        }
    }

    /// Copy out the embedded `ancestor` sub-object.
    ///
    /// The ancestor's non-virtual part is contiguous; its virtual bases are
    /// gathered from where this object placed them.
    pub fn upcast(&self, registry: &TypeRegistry, ancestor: TypeId) -> Result<Instance, TypeError> {
        let entry = registry.ancestor(self.ty, ancestor).ok_or_else(|| TypeError::TypeMismatch {
            from: registry.type_label(self.ty),
            to: registry.type_label(ancestor),
        })?;
        let target = registry.descriptor(ancestor);
        if target.virtual_bases.is_empty() {
            return self.slice(registry, ancestor, entry.offset, target.size);
        }

        let mut bytes = vec![0; target.size];
        self.copy_into(registry, &mut bytes[..target.nv_size], entry.offset)?;
        for &(virtual_base, at) in &target.virtual_bases {
            let source = registry
                .descriptor(self.ty)
                .virtual_bases
                .iter()
                .find(|(vb, _)| *vb == virtual_base)
                .map_or(at, |&(_, source)| source);
            let len = registry.descriptor(virtual_base).nv_size;
            self.copy_into(registry, &mut bytes[at..at + len], source)?;
        }
        Ok(Instance {
            ty: ancestor,
            bytes: bytes.into_boxed_slice(),
        })
    }

    fn copy_into(&self, registry: &TypeRegistry, out: &mut [u8], offset: usize) -> Result<(), TypeError> {
        let end = offset + out.len();
        let source = self
            .bytes
            .get(offset..end)
            .ok_or_else(|| self.size_error(registry, end))?;
        out.copy_from_slice(source);
        Ok(())
    }

    /// Copy `size` bytes at `offset` as an instance of `ty`.
    pub fn slice(
        &self,
        registry: &TypeRegistry,
        ty: TypeId,
        offset: usize,
        size: usize,
    ) -> Result<Instance, TypeError> {
        let end = offset + size;
        match self.bytes.get(offset..end) {
            Some(bytes) => Ok(Instance {
                ty,
                bytes: bytes.into(),
            }),
            None => Err(self.size_error(registry, end)),
        }
    }

    fn size_error(&self, registry: &TypeRegistry, needed: usize) -> TypeError {
        TypeError::SizeMismatch {
            ty: registry.type_label(self.ty),
            expected: needed,
            got: self.bytes.len(),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({:?}, {} bytes)", self.ty, self.bytes.len())
    }
}
