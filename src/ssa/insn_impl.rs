use super::*;

impl SsaInsn {
    /// The register this instruction defines, if any.
    pub fn result(&self) -> Option<VReg> {
        match self {
            SsaInsn::Normal { result, .. } => *result,
            SsaInsn::Phi { result, .. } => Some(*result),
        }
    }

    /// Whether this instruction defines `reg`.
    pub fn is_result_reg(&self, reg: VReg) -> bool {
        self.result() == Some(reg)
    }

    /// Source registers, in operand order. A phi's sources are its per-edge
    /// arguments.
    pub fn sources(&self) -> Vec<VReg> {
        match self {
            SsaInsn::Normal { sources, .. } => sources.clone(),
            SsaInsn::Phi { args, .. } => args.iter().map(|&(_, reg)| reg).collect(),
        }
    }

    /// Whether this instruction reads `reg` as a source.
    pub fn reads(&self, reg: VReg) -> bool {
        match self {
            SsaInsn::Normal { sources, .. } => sources.contains(&reg),
            SsaInsn::Phi { args, .. } => args.iter().any(|&(_, r)| r == reg),
        }
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, SsaInsn::Phi { .. })
    }
}
