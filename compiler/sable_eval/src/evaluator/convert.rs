//! Value-level conversions, carrying out the registry's conversion plans.

use std::rc::Rc;

use sable_types::{Indirection, Relation, TypeId};

use crate::errors::{wrong_type, EvalResult};
use crate::value::RefValue;
use crate::{Evaluator, Value};

impl Evaluator {
    /// Convert `value` to type `to`.
    ///
    /// Upcasts slice objects down to the ancestor's part; builtins upcast
    /// to themselves. Converting a value to a pointer or reference type
    /// places it in a fresh cell; converting from one copies the referent
    /// out. Downcasts only succeed through a pointer or reference whose
    /// referent really has the target type (or a descendant).
    ///
    /// Identity and downcast conversions between pointers or references
    /// share the original cell. Upcasts and delegate conversions copy the
    /// sliced referent into a fresh cell, so writes through the result are
    /// not seen through the source.
    pub fn convert(&self, value: &Value, to: TypeId) -> EvalResult {
        let from = value.type_of();
        if from == to {
            return Ok(value.clone());
        }
        let plan = self.types.conversion(from, to)?;
        tracing::trace!(?plan, "conversion");

        let (cell, referent) = match value {
            Value::Ref(r) => (Some(Rc::clone(&r.cell)), r.cell.borrow().clone()),
            other => (None, other.clone()),
        };

        let converted = match plan.relation {
            Relation::Identity => referent,
            Relation::Upcast { .. } => match referent {
                Value::Object(instance) => Value::Object(instance.upcast(&self.types, plan.target)?),
                other => other,
            },
            Relation::Downcast { .. } => {
                let dynamic = referent.type_of();
                if cell.is_none() || !self.types.is_subtype_of(dynamic, plan.target) {
                    return Err(self.mismatch(from, to));
                }
                referent
            }
            Relation::Delegate { offset, .. } => match referent {
                Value::Object(instance) => {
                    let size = self.types.size_of(plan.target);
                    Value::Object(instance.slice(&self.types, plan.target, offset, size)?)
                }
                _ => return Err(self.mismatch(from, to)),
            },
            Relation::Convert { .. } => return Err(self.mismatch(from, to)),
        };

        match self.types.indirection(to).0 {
            Indirection::Value => Ok(converted),
            Indirection::Pointer | Indirection::Reference => {
                // Identity and downcasts alias the source cell; slices are copies.
                let aliases = matches!(plan.relation, Relation::Identity | Relation::Downcast { .. });
                match cell {
                    Some(cell) if aliases => Ok(Value::Ref(RefValue { ty: to, cell })),
                    _ => Ok(Value::reference(to, converted)),
                }
            }
        }
    }

    fn mismatch(&self, from: TypeId, to: TypeId) -> crate::EvalError {
        wrong_type(&self.types.type_label(to), &self.types.type_label(from))
    }
}
