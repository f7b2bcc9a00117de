//! Per-register liveness analysis and interference construction
//!
//! The analysis half of a graph-coloring register allocator for SSA-form
//! bytecode: each register's uses are traced backward through the block
//! graph, marking per-block live-in/live-out sets and recording an
//! interference edge whenever the register is live across the definition of
//! another.
//!
//! ## Algorithm
//!
//! This is the per-variable liveness calculation of Appel's algorithm 19.17.
//! The book presents it as three mutually tail-recursive functions; they are
//! rewritten here as states of a small dispatcher loop, so recursion depth
//! cannot grow with program size:
//!
//! - `LiveOutAtBlock`: on first visit, mark the register live-out of the
//!   block and step to its last statement.
//! - `LiveOutAtStatement`: a statement defining a different register records
//!   an interference edge and continues upward; a statement defining the
//!   register itself kills the walk.
//! - `LiveInAtStatement`: at the block's first statement, mark live-in and
//!   queue every predecessor for a live-out visit; otherwise step to the
//!   preceding statement.
//!
//! Each register's run keeps its own visited-block set, so a block is
//! processed at most once per register and cyclic graphs terminate.
//!
//! After every register is traced, phi results sharing a block are forced to
//! mutually interfere; use tracing alone cannot see that dead-end phis still
//! need distinct storage.
//!
//! ## References
//!
//! - Appel, A. "Modern Compiler Implementation", algorithm 19.17

use bitvec::bitvec;
use bitvec::vec::BitVec;
use log::{debug, trace};
use thiserror::Error;

use crate::interference::InterferenceGraph;
use crate::ssa::{BlockId, SsaInsn, SsaMethod, UseSite, VReg};


/// Consistency violations in the method handed to the analyzer.
///
/// Either one means the block graph and the use-lists disagree, i.e. SSA
/// construction produced a malformed method. The analysis stops at the
/// first violation rather than continue with partial results.
#[derive(Debug, Error)]
pub enum LivenessError {
    /// A use-list entry does not resolve to an instruction in its claimed
    /// block that reads the register.
    #[error("use of {reg} not found in {block}")]
    UseNotFound { reg: VReg, block: BlockId },

    /// A phi argument names a block that is not a predecessor of the phi's
    /// block.
    #[error("phi in {block} reads from {pred}, which is not a predecessor")]
    PhiPredMismatch { block: BlockId, pred: BlockId },
}

/// The next transition to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextFunction {
    LiveInAtStatement,
    LiveOutAtStatement,
    LiveOutAtBlock,
    Done,
}

/// Computes liveness of one register across the whole method, updating the
/// per-block live sets and the interference graph as it goes.
struct LivenessAnalyzer<'a> {
    method: &'a mut SsaMethod,
    interference: &'a mut InterferenceGraph,
    /// Register under analysis.
    reg: VReg,
    /// Blocks already processed for `reg`. Bounds the walk to one visit per
    /// block, which is what terminates cyclic graphs.
    visited_blocks: BitVec,
    /// Blocks waiting for a live-out-at-block transition.
    live_out_blocks: BitVec,
    /// Current block of the walk.
    block_n: BlockId,
    /// Index of the current statement within `block_n`.
    statement_index: usize,
    next_function: NextFunction,
}

/// How a use site reads the register under analysis.
enum UseKind {
    /// Through a phi, along the edges from these predecessor blocks.
    Phi(Vec<BlockId>),
    /// As an ordinary source operand.
    Normal,
}

/// Runs the liveness algorithm for every register of `method`, updating the
/// blocks' live-in/live-out sets in place and returning the interference
/// graph.
///
/// The live sets are as much an output as the graph: later passes extend
/// live ranges across register windows using them, and they cannot be
/// recovered from the graph alone. Register runs only ever add bits and
/// edges, so their order is irrelevant and rerunning the driver reproduces
/// the same state.
pub fn construct_interference_graph(
    method: &mut SsaMethod,
) -> Result<InterferenceGraph, LivenessError> {
    let mut interference = InterferenceGraph::new(method.reg_count);
    let use_lists = method.build_use_lists();

    debug!(
        "liveness: {} registers over {} blocks",
        method.reg_count,
        method.blocks.len()
    );

    for (reg, use_list) in use_lists.iter().enumerate() {
        LivenessAnalyzer::new(method, &mut interference, VReg(reg as u32)).run(use_list)?;
    }

    co_interfere_phis(method, &mut interference);

    debug!("liveness: {} interference edges", interference.edge_count());

    Ok(interference)
}

impl<'a> LivenessAnalyzer<'a> {
    fn new(method: &'a mut SsaMethod, interference: &'a mut InterferenceGraph, reg: VReg) -> Self {
        let block_count = method.blocks.len();
        Self {
            method,
            interference,
            reg,
            visited_blocks: bitvec![0; block_count],
            live_out_blocks: bitvec![0; block_count],
            block_n: BlockId(0),
            statement_index: 0,
            next_function: NextFunction::Done,
        }
    }

    /// Seed the walk from every use of the register, then drain the
    /// live-out worklist those seeds produce.
    fn run(&mut self, use_list: &[UseSite]) -> Result<(), LivenessError> {
        trace!("{}: {} use sites", self.reg, use_list.len());

        for &site in use_list {
            match self.classify_use(site)? {
                UseKind::Phi(preds) => {
                    // The value must arrive along each supplying edge, so it
                    // is live out of those predecessors, not live into the
                    // phi's own block.
                    for pred in preds {
                        self.block_n = pred;
                        self.next_function = NextFunction::LiveOutAtBlock;
                        self.dispatch();
                    }
                }
                UseKind::Normal => {
                    self.block_n = site.block;
                    self.statement_index = site.insn;
                    self.next_function = NextFunction::LiveInAtStatement;
                    self.dispatch();
                }
            }
        }

        while let Some(idx) = self.live_out_blocks.first_one() {
            self.live_out_blocks.set(idx, false);
            self.block_n = BlockId(idx as u32);
            self.next_function = NextFunction::LiveOutAtBlock;
            self.dispatch();
        }

        Ok(())
    }

    /// Resolve a use site against the block graph, failing on inconsistency
    /// instead of analyzing a method that disagrees with its own use-lists.
    fn classify_use(&self, site: UseSite) -> Result<UseKind, LivenessError> {
        let block = self.method.block(site.block);
        match block.insns.get(site.insn) {
            Some(SsaInsn::Phi { args, .. }) => {
                let mut preds = Vec::new();
                for &(pred, arg) in args {
                    if arg != self.reg {
                        continue;
                    }
                    if !block.predecessors.contains(&pred) {
                        return Err(LivenessError::PhiPredMismatch {
                            block: block.id,
                            pred,
                        });
                    }
                    preds.push(pred);
                }
                if preds.is_empty() {
                    return Err(LivenessError::UseNotFound {
                        reg: self.reg,
                        block: block.id,
                    });
                }
                Ok(UseKind::Phi(preds))
            }
            Some(insn) if insn.reads(self.reg) => Ok(UseKind::Normal),
            _ => Err(LivenessError::UseNotFound {
                reg: self.reg,
                block: block.id,
            }),
        }
    }

    /// Drive transitions until the current chain of work is exhausted.
    ///
    /// Every transition sets `next_function` before returning (or leaves it
    /// `Done` to stop), so this loop is the whole control flow of the
    /// algorithm.
    fn dispatch(&mut self) {
        loop {
            match std::mem::replace(&mut self.next_function, NextFunction::Done) {
                NextFunction::LiveInAtStatement => self.live_in_at_statement(),
                NextFunction::LiveOutAtStatement => self.live_out_at_statement(),
                NextFunction::LiveOutAtBlock => self.live_out_at_block(),
                NextFunction::Done => break,
            }
        }
    }

    /// The register is live out of `block_n`.
    fn live_out_at_block(&mut self) {
        let idx = self.block_n.0 as usize;
        if self.visited_blocks[idx] {
            return;
        }
        self.visited_blocks.set(idx, true);
        trace!("{} live out at {}", self.reg, self.block_n);

        let block = self.method.block_mut(self.block_n);
        block.add_live_out(self.reg);

        match block.insns.len() {
            // An empty block defines nothing; liveness flows straight
            // through to its predecessors.
            0 => {
                self.statement_index = 0;
                self.next_function = NextFunction::LiveInAtStatement;
            }
            n => {
                self.statement_index = n - 1;
                self.next_function = NextFunction::LiveOutAtStatement;
            }
        }
    }

    /// The register is live immediately after the current statement.
    fn live_out_at_statement(&mut self) {
        let result = self.method.block(self.block_n).insns[self.statement_index].result();

        // A definition of the register kills its liveness above this
        // statement: the walk stops, and no self-edge is recorded.
        if result == Some(self.reg) {
            return;
        }

        // Live across a definition of a different register: the two cannot
        // share storage.
        if let Some(result) = result {
            self.interference.add(self.reg, result);
        }
        self.next_function = NextFunction::LiveInAtStatement;
    }

    /// The register is live immediately before the current statement.
    fn live_in_at_statement(&mut self) {
        if self.statement_index == 0 {
            self.method.block_mut(self.block_n).add_live_in(self.reg);
            // Live on entry means live out of every predecessor.
            for &pred in &self.method.block(self.block_n).predecessors {
                self.live_out_blocks.set(pred.0 as usize, true);
            }
        } else {
            self.statement_index -= 1;
            self.next_function = NextFunction::LiveOutAtStatement;
        }
    }
}

/// Forces all phi results within one basic block to mutually interfere.
///
/// Dead-code removal lets "dead-end" phis through: results that are never
/// read again, which per-register use tracing therefore never reaches. If
/// two such results were allocated the same storage, the move scheduler
/// that replaces phis with copies at block boundaries could overwrite one
/// result before the copy reading the other runs.
fn co_interfere_phis(method: &SsaMethod, interference: &mut InterferenceGraph) {
    for block in &method.blocks {
        let results = block.phi_results();
        for (i, &a) in results.iter().enumerate() {
            for &b in &results[i + 1..] {
                interference.add(a, b);
            }
        }
    }
}
