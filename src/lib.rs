//! Register liveness and interference graphs for SSA-form bytecode
//!
//! This crate implements the analysis half of a graph-coloring register
//! allocator: given a method in SSA form, it computes per-block
//! live-in/live-out sets and an interference graph over the method's
//! registers. The downstream allocator assigns storage by coloring that
//! graph, and the phi-elimination move scheduler uses the same graph to
//! avoid overwriting values that are still live.
//!
//! ```
//! use ssa_liveness::{SsaInsn, SsaMethod, construct_interference_graph};
//!
//! let mut method = SsaMethod::new();
//! let b0 = method.alloc_block();
//! let v0 = method.alloc_vreg();
//! let v1 = method.alloc_vreg();
//!
//! // v0 = const; v1 = not v0; return v1
//! method.block_mut(b0).insns.extend([
//!     SsaInsn::Normal { result: Some(v0), sources: vec![] },
//!     SsaInsn::Normal { result: Some(v1), sources: vec![v0] },
//!     SsaInsn::Normal { result: None, sources: vec![v1] },
//! ]);
//!
//! let graph = construct_interference_graph(&mut method).unwrap();
//! // v0 dies at the instruction defining v1, so they may share storage.
//! assert!(!graph.interferes(v0, v1));
//! ```

pub mod interference;
pub mod liveness;
pub mod ssa;

pub use interference::InterferenceGraph;
pub use liveness::{LivenessError, construct_interference_graph};
pub use ssa::{BlockId, SsaBlock, SsaInsn, SsaMethod, UseSite, VReg};
