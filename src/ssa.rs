//! SSA method representation consumed by the liveness analyzer
//!
//! A method is an ordered list of basic blocks; a block is an ordered list
//! of instructions plus its predecessor edges and the live-in/live-out sets
//! the analyzer fills in. Instructions carry only what liveness needs: an
//! optional result register and source registers, with phi sources tagged
//! by the predecessor they arrive from. Opcodes, operand encodings, and the
//! SSA construction pass that builds all of this live elsewhere in the
//! pipeline.

use std::fmt;

use bitvec::vec::BitVec;

mod insn_impl;
mod method_impl;

#[cfg(test)]
mod tests;

/// SSA virtual register. Registers form a dense `0..reg_count` space per
/// method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VReg(pub u32);

impl fmt::Display for VReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Basic block identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// One instruction's worth of liveness-relevant structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsaInsn {
    /// Ordinary instruction: an optional result plus its source operands.
    Normal {
        result: Option<VReg>,
        sources: Vec<VReg>,
    },
    /// Phi: merges one value per incoming edge. Phis sit at the front of
    /// their block, before any ordinary instruction.
    Phi {
        result: VReg,
        /// (predecessor block, register read along that edge)
        args: Vec<(BlockId, VReg)>,
    },
}

/// A use site: which instruction of which block reads a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseSite {
    pub block: BlockId,
    /// Index into the owning block's instruction list.
    pub insn: usize,
}

/// Basic block: instructions plus the liveness bookkeeping the analyzer
/// fills in.
///
/// The live sets are only ever written through [`SsaBlock::add_live_in`] and
/// [`SsaBlock::add_live_out`], both idempotent, so reruns and overlapping
/// per-register walks accumulate without conflict.
#[derive(Debug, Clone)]
pub struct SsaBlock {
    pub id: BlockId,
    pub insns: Vec<SsaInsn>,
    /// Predecessor blocks, wired up via [`SsaMethod::add_edge`].
    pub predecessors: Vec<BlockId>,
    live_in: BitVec,
    live_out: BitVec,
}

/// An SSA method: the block graph the analyzer walks.
#[derive(Debug, Clone)]
pub struct SsaMethod {
    pub blocks: Vec<SsaBlock>,
    /// Total SSA registers; the dense register space is `0..reg_count`.
    pub reg_count: u32,
}
