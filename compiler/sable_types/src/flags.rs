//! Pre-computed descriptor flags.
//!
//! Set while types are registered and laid out, so hot paths (dispatch,
//! conversion) can test a bit instead of walking the descriptor.

use bitflags::bitflags;

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u32 {
        /// One of the fixed interpreter-native kinds.
        const IS_BUILTIN = 1 << 0;
        /// Pointer or reference: conversion and dispatch look through it.
        const IS_INDIRECT = 1 << 1;
        /// Has declared members.
        const IS_COMPOSITE = 1 << 2;
        /// Has at least one `VirtualSubtype` base edge.
        const HAS_VIRTUAL_BASE = 1 << 3;
        /// Layout has been computed.
        const IS_LAID_OUT = 1 << 4;
    }
}
