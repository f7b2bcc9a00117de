use super::*;

impl SsaBlock {
    fn new(id: BlockId) -> Self {
        Self {
            id,
            insns: Vec::new(),
            predecessors: Vec::new(),
            live_in: BitVec::new(),
            live_out: BitVec::new(),
        }
    }

    /// Mark `reg` live on entry to this block. Idempotent.
    pub fn add_live_in(&mut self, reg: VReg) {
        mark(&mut self.live_in, reg);
    }

    /// Mark `reg` live on exit from this block. Idempotent.
    pub fn add_live_out(&mut self, reg: VReg) {
        mark(&mut self.live_out, reg);
    }

    pub fn is_live_in(&self, reg: VReg) -> bool {
        self.live_in.get(reg.0 as usize).is_some_and(|b| *b)
    }

    pub fn is_live_out(&self, reg: VReg) -> bool {
        self.live_out.get(reg.0 as usize).is_some_and(|b| *b)
    }

    /// Registers live on entry, in ascending order.
    pub fn live_in_regs(&self) -> impl Iterator<Item = VReg> + '_ {
        self.live_in.iter_ones().map(|r| VReg(r as u32))
    }

    /// Registers live on exit, in ascending order.
    pub fn live_out_regs(&self) -> impl Iterator<Item = VReg> + '_ {
        self.live_out.iter_ones().map(|r| VReg(r as u32))
    }

    /// Result registers of this block's phis, in block order.
    pub fn phi_results(&self) -> Vec<VReg> {
        self.insns
            .iter()
            .filter_map(|insn| match insn {
                SsaInsn::Phi { result, .. } => Some(*result),
                SsaInsn::Normal { .. } => None,
            })
            .collect()
    }
}

// The live sets grow on demand: blocks can be created before the final
// register count is known.
fn mark(set: &mut BitVec, reg: VReg) {
    let idx = reg.0 as usize;
    if set.len() <= idx {
        set.resize(idx + 1, false);
    }
    set.set(idx, true);
}

impl SsaMethod {
    /// Create a new empty method
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            reg_count: 0,
        }
    }

    /// Allocate a new SSA register
    pub fn alloc_vreg(&mut self) -> VReg {
        let reg = VReg(self.reg_count);
        self.reg_count += 1;
        reg
    }

    /// Allocate a new, empty basic block
    pub fn alloc_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(SsaBlock::new(id));
        id
    }

    /// Record a control-flow edge `from -> to`.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        let preds = &mut self.block_mut(to).predecessors;
        if !preds.contains(&from) {
            preds.push(from);
        }
    }

    /// Get a reference to a block
    pub fn block(&self, id: BlockId) -> &SsaBlock {
        let idx = id.0 as usize;
        if let Some(block) = self.blocks.get(idx)
            && block.id == id
        {
            return block;
        }
        self.blocks
            .iter()
            .find(|b| b.id == id)
            .unwrap_or_else(|| panic!("Block {:?} not found", id))
    }

    /// Get a mutable reference to a block
    pub fn block_mut(&mut self, id: BlockId) -> &mut SsaBlock {
        let idx = id.0 as usize;
        let fast_path = self.blocks.get(idx).is_some_and(|b| b.id == id);
        if fast_path {
            return &mut self.blocks[idx];
        }
        self.blocks
            .iter_mut()
            .find(|b| b.id == id)
            .unwrap_or_else(|| panic!("Block {:?} not found", id))
    }

    /// For every register, the sites that read it.
    ///
    /// One entry per source occurrence: an instruction reading a register
    /// twice contributes two interchangeable entries, which the analyzer
    /// tolerates because all of its transitions are idempotent.
    pub fn build_use_lists(&self) -> Vec<Vec<UseSite>> {
        let mut lists = vec![Vec::new(); self.reg_count as usize];
        for block in &self.blocks {
            for (i, insn) in block.insns.iter().enumerate() {
                for src in insn.sources() {
                    lists[src.0 as usize].push(UseSite {
                        block: block.id,
                        insn: i,
                    });
                }
            }
        }
        lists
    }
}

impl Default for SsaMethod {
    fn default() -> Self {
        Self::new()
    }
}
