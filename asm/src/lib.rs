pub mod mips;

pub use mips::{emit, BranchTarget, Inst, Label, Reg, Runtime, Word};
