//! Symbols for the Sable runtime.
//!
//! Programs reach the evaluator as S-expressions whose atoms include
//! symbols; this crate owns their interned representation ([`Name`]),
//! the process-wide [`interner`], and the [`Keyword`] tags that mark
//! reserved symbols.

mod interner;
mod keyword;
mod name;

pub use interner::{intern, interner, InternError, StringInterner};
pub use keyword::Keyword;
pub use name::Name;
