//! Textual model of the emitted subset of the target instruction set. Each
//! [`Inst`] displays as exactly one line of assembly; [`emit`] serializes an
//! instruction stream to the bytes written to standard output.

use std::fmt::{self, Display, Formatter};
use std::io::Write as _;

/// The fixed register assignment of the generated code.
///
/// `$3` carries every expression result (or lvalue address), `$4` holds the
/// constant 4, `$11` the constant 1, `$10` the address of `print`; `$29` is
/// the frame pointer and `$30` the downward-growing stack pointer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Reg {
    Zero,
    Arg1,
    Arg2,
    Result,
    Four,
    Tmp5,
    Tmp6,
    Tmp7,
    PrintAddr,
    One,
    Fp,
    Sp,
    Ra,
}

impl Reg {
    const fn number(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::Arg1 => 1,
            Self::Arg2 => 2,
            Self::Result => 3,
            Self::Four => 4,
            Self::Tmp5 => 5,
            Self::Tmp6 => 6,
            Self::Tmp7 => 7,
            Self::PrintAddr => 10,
            Self::One => 11,
            Self::Fp => 29,
            Self::Sp => 30,
            Self::Ra => 31,
        }
    }
}

impl Display for Reg {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "${}", self.number())
    }
}

/// Entry points provided by the runtime library.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Runtime {
    Print,
    Init,
    New,
    Delete,
}

impl Display for Runtime {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Print => "print",
            Self::Init => "init",
            Self::New => "new",
            Self::Delete => "delete",
        })
    }
}

/// Branch and call targets defined by the generated program itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Label {
    /// `F<identifier>` for a user procedure (including `wain`).
    Proc(Box<str>),
    Else(u64),
    Endif(u64),
    Loop(u64),
    EndWhile(u64),
    SkipDelete(u64),
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Proc(name) => write!(f, "F{name}"),
            Self::Else(n) => write!(f, "Felse{n}"),
            Self::Endif(n) => write!(f, "Fendif{n}"),
            Self::Loop(n) => write!(f, "Floop{n}"),
            Self::EndWhile(n) => write!(f, "Fendwhile{n}"),
            Self::SkipDelete(n) => write!(f, "FskipDelete{n}"),
        }
    }
}

/// Operand of a `.word` directive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Word {
    Imm(i64),
    Label(Label),
    Runtime(Runtime),
}

impl Display for Word {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Imm(n) => write!(f, "{n}"),
            Self::Label(label) => write!(f, "{label}"),
            Self::Runtime(entry) => write!(f, "{entry}"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BranchTarget {
    Label(Label),
    /// Raw displacement in instruction words.
    Words(i32),
}

impl Display for BranchTarget {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Label(label) => write!(f, "{label}"),
            Self::Words(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Inst {
    Add(Reg, Reg, Reg),
    Sub(Reg, Reg, Reg),
    Mult(Reg, Reg),
    Div(Reg, Reg),
    Mflo(Reg),
    Mfhi(Reg),
    Slt(Reg, Reg, Reg),
    Sltu(Reg, Reg, Reg),
    Lis(Reg),
    Word(Word),
    Lw(Reg, i32, Reg),
    Sw(Reg, i32, Reg),
    Beq(Reg, Reg, BranchTarget),
    Bne(Reg, Reg, BranchTarget),
    Jr(Reg),
    Jalr(Reg),
    Label(Label),
    Import(Runtime),
}

impl Display for Inst {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Add(d, s, t) => write!(f, "add {d}, {s}, {t}"),
            Self::Sub(d, s, t) => write!(f, "sub {d}, {s}, {t}"),
            Self::Mult(s, t) => write!(f, "mult {s}, {t}"),
            Self::Div(s, t) => write!(f, "div {s}, {t}"),
            Self::Mflo(d) => write!(f, "mflo {d}"),
            Self::Mfhi(d) => write!(f, "mfhi {d}"),
            Self::Slt(d, s, t) => write!(f, "slt {d}, {s}, {t}"),
            Self::Sltu(d, s, t) => write!(f, "sltu {d}, {s}, {t}"),
            Self::Lis(d) => write!(f, "lis {d}"),
            Self::Word(word) => write!(f, ".word {word}"),
            Self::Lw(t, offset, s) => write!(f, "lw {t}, {offset}({s})"),
            Self::Sw(t, offset, s) => write!(f, "sw {t}, {offset}({s})"),
            Self::Beq(s, t, target) => write!(f, "beq {s}, {t}, {target}"),
            Self::Bne(s, t, target) => write!(f, "bne {s}, {t}, {target}"),
            Self::Jr(s) => write!(f, "jr {s}"),
            Self::Jalr(s) => write!(f, "jalr {s}"),
            Self::Label(label) => write!(f, "{label}:"),
            Self::Import(entry) => write!(f, ".import {entry}"),
        }
    }
}

/// Serialize an instruction stream, one instruction per line.
pub fn emit(program: &[Inst]) -> Box<[u8]> {
    let mut bytes = Vec::new();
    for inst in program {
        let _ = writeln!(bytes, "{inst}");
    }
    bytes.into()
}
