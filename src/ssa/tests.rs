use super::*;

fn make_branching_method() -> SsaMethod {
    // bb0: v0 = const; goto bb1 / bb2
    // bb1: v1 = neg v0; goto bb3
    // bb2: v2 = neg v0; goto bb3
    // bb3: v3 = phi(v1 from bb1, v2 from bb2); return v3
    let mut method = SsaMethod::new();
    let b0 = method.alloc_block();
    let b1 = method.alloc_block();
    let b2 = method.alloc_block();
    let b3 = method.alloc_block();
    method.add_edge(b0, b1);
    method.add_edge(b0, b2);
    method.add_edge(b1, b3);
    method.add_edge(b2, b3);

    let v0 = method.alloc_vreg();
    let v1 = method.alloc_vreg();
    let v2 = method.alloc_vreg();
    let v3 = method.alloc_vreg();

    method.block_mut(b0).insns.push(SsaInsn::Normal {
        result: Some(v0),
        sources: vec![],
    });
    method.block_mut(b0).insns.push(SsaInsn::Normal {
        result: None,
        sources: vec![],
    });
    method.block_mut(b1).insns.push(SsaInsn::Normal {
        result: Some(v1),
        sources: vec![v0],
    });
    method.block_mut(b1).insns.push(SsaInsn::Normal {
        result: None,
        sources: vec![],
    });
    method.block_mut(b2).insns.push(SsaInsn::Normal {
        result: Some(v2),
        sources: vec![v0],
    });
    method.block_mut(b2).insns.push(SsaInsn::Normal {
        result: None,
        sources: vec![],
    });
    method.block_mut(b3).insns.push(SsaInsn::Phi {
        result: v3,
        args: vec![(b1, v1), (b2, v2)],
    });
    method.block_mut(b3).insns.push(SsaInsn::Normal {
        result: None,
        sources: vec![v3],
    });

    method
}

#[test]
fn predecessors_follow_edges() {
    let method = make_branching_method();

    assert!(method.block(BlockId(0)).predecessors.is_empty());
    assert_eq!(method.block(BlockId(1)).predecessors, vec![BlockId(0)]);
    assert_eq!(
        method.block(BlockId(3)).predecessors,
        vec![BlockId(1), BlockId(2)]
    );
}

#[test]
fn duplicate_edges_collapse() {
    let mut method = SsaMethod::new();
    let b0 = method.alloc_block();
    let b1 = method.alloc_block();
    method.add_edge(b0, b1);
    method.add_edge(b0, b1);

    assert_eq!(method.block(b1).predecessors, vec![b0]);
}

#[test]
fn use_lists_cover_normal_and_phi_sources() {
    let method = make_branching_method();
    let use_lists = method.build_use_lists();

    // v0 is read once in bb1 and once in bb2.
    assert_eq!(
        use_lists[0],
        vec![
            UseSite {
                block: BlockId(1),
                insn: 0
            },
            UseSite {
                block: BlockId(2),
                insn: 0
            },
        ]
    );

    // v1 is read only by the phi.
    assert_eq!(
        use_lists[1],
        vec![UseSite {
            block: BlockId(3),
            insn: 0
        }]
    );

    // v3 is read by the return.
    assert_eq!(
        use_lists[3],
        vec![UseSite {
            block: BlockId(3),
            insn: 1
        }]
    );
}

#[test]
fn double_read_yields_two_use_entries() {
    let mut method = SsaMethod::new();
    let b0 = method.alloc_block();
    let v0 = method.alloc_vreg();
    let v1 = method.alloc_vreg();

    method.block_mut(b0).insns.push(SsaInsn::Normal {
        result: Some(v1),
        sources: vec![v0, v0],
    });

    let use_lists = method.build_use_lists();
    assert_eq!(use_lists[0].len(), 2);
    assert!(use_lists[1].is_empty());
}

#[test]
fn insn_accessors() {
    let method = make_branching_method();

    let add = &method.block(BlockId(1)).insns[0];
    assert_eq!(add.result(), Some(VReg(1)));
    assert!(add.is_result_reg(VReg(1)));
    assert!(!add.is_result_reg(VReg(0)));
    assert!(add.reads(VReg(0)));
    assert!(!add.is_phi());

    let merge = &method.block(BlockId(3)).insns[0];
    assert!(merge.is_phi());
    assert_eq!(merge.result(), Some(VReg(3)));
    assert_eq!(merge.sources(), vec![VReg(1), VReg(2)]);
    assert!(merge.reads(VReg(2)));
    assert!(!merge.reads(VReg(0)));
}

#[test]
fn phi_results_in_block_order() {
    let method = make_branching_method();

    assert!(method.block(BlockId(0)).phi_results().is_empty());
    assert_eq!(method.block(BlockId(3)).phi_results(), vec![VReg(3)]);
}

#[test]
fn live_set_adds_are_idempotent() {
    let mut method = SsaMethod::new();
    let b0 = method.alloc_block();
    let v3 = VReg(3);

    let block = method.block_mut(b0);
    block.add_live_in(v3);
    block.add_live_in(v3);
    block.add_live_out(v3);

    assert!(block.is_live_in(v3));
    assert!(block.is_live_out(v3));
    assert_eq!(block.live_in_regs().collect::<Vec<_>>(), vec![v3]);
    assert_eq!(block.live_out_regs().collect::<Vec<_>>(), vec![v3]);

    // Registers never marked read back as dead, in and out of range.
    assert!(!block.is_live_in(VReg(0)));
    assert!(!block.is_live_in(VReg(100)));
}

#[test]
#[should_panic(expected = "not found")]
fn unknown_block_panics() {
    let method = make_branching_method();
    method.block(BlockId(9));
}
