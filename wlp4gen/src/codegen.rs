//! Production-directed translation of the annotated parse tree into target
//! assembly.
//!
//! Every expression handler leaves its value in `$3`; every lvalue handler
//! leaves an address there instead. All stack traffic goes through the
//! push/pop helpers so the emitted sequences stay lexically balanced.

use asm::{BranchTarget, Inst, Label, Reg, Runtime, Word};
use log::debug;
use symtab::SymbolTableStack;
use tree::{Inner, Leaf, Node, Production, TokenKind, VarType};

pub use symtab::Error;

/// The typed null pointer: nonzero so it is falsy nowhere, unaligned so a
/// dereference traps on a word-aligned load.
const NULL_PTR: i64 = 69;

/// Registers a user procedure preserves for its caller, in push order.
const SAVED: [Reg; 5] = [Reg::Arg1, Reg::Arg2, Reg::Tmp5, Reg::Tmp6, Reg::Tmp7];

/// Translate a loaded tree into the bytes of the assembly program.
pub fn generate(root: &Node) -> Result<Box<[u8]>, Error> {
    let mut gen = Generator::default();
    gen.prelude();
    gen.node(root)?;
    debug_assert_eq!(gen.tables.depth(), 0, "unbalanced scope stack");
    Ok(asm::emit(&gen.program))
}

#[derive(Default)]
struct Generator {
    tables: SymbolTableStack<VarType>,
    labels: u64,
    program: Vec<Inst>,
}

/// Pointer comparisons are unsigned.
const fn cmp(ty: VarType, d: Reg, s: Reg, t: Reg) -> Inst {
    match ty {
        VarType::Int => Inst::Slt(d, s, t),
        VarType::IntStar => Inst::Sltu(d, s, t),
    }
}

impl Generator {
    /// Runtime imports, the constant registers, and the jump to `Fwain`.
    fn prelude(&mut self) {
        for entry in [Runtime::Print, Runtime::Init, Runtime::New, Runtime::Delete] {
            self.program.push(Inst::Import(entry));
        }
        self.lis(Reg::Four, Word::Imm(4));
        self.lis(Reg::PrintAddr, Word::Runtime(Runtime::Print));
        self.lis(Reg::One, Word::Imm(1));
        self.program.push(Inst::Beq(
            Reg::Zero,
            Reg::Zero,
            BranchTarget::Label(Label::Proc("wain".into())),
        ));
    }

    fn node(&mut self, node: &Node) -> Result<(), Error> {
        match node {
            Node::Leaf(leaf) => self.leaf(leaf),
            Node::Inner(inner) => self.inner(inner),
        }
    }

    fn leaf(&mut self, leaf: &Leaf) -> Result<(), Error> {
        match leaf.token.kind {
            TokenKind::Num => self.lis(Reg::Result, Word::Imm(leaf.num())),
            TokenKind::Null => self.lis(Reg::Result, Word::Imm(NULL_PTR)),
            TokenKind::Id => {
                let offset = self.tables.binding(leaf.lexeme())?.offset;
                self.program.push(Inst::Lw(Reg::Result, offset, Reg::Fp));
            }
            _ => {}
        }
        Ok(())
    }

    fn inner(&mut self, node: &Inner) -> Result<(), Error> {
        use Production::*;
        let kids = &node.children;
        match node.production {
            Start => self.node(&kids[1]),
            ProceduresMain => self.node(&kids[0]),
            ProceduresChain => {
                self.node(&kids[0])?;
                self.node(&kids[1])
            }
            Main => self.wain(node),
            Procedure => self.procedure(node),

            // Table side effects and call-site bookkeeping only; no code.
            TypeInt | TypeIntStar | ParamsEmpty | DclsEmpty | StatementsEmpty | ArglistLast
            | ArglistCons => Ok(()),
            Dcl => {
                let id = &kids[1];
                self.tables.insert_local(id.lexeme(), id.var_type())
            }
            ParamsList => {
                self.node(&kids[0])?;
                self.tables.invert_param_offsets()
            }
            ParamLast => self.param(&kids[0]),
            ParamCons => {
                self.param(&kids[0])?;
                self.node(&kids[2])
            }

            DclsNum | DclsNull => {
                self.node(&kids[0])?;
                self.node(&kids[1])?;
                self.node(&kids[3])?;
                self.push(Reg::Result);
                Ok(())
            }
            StatementsChain => {
                self.node(&kids[0])?;
                self.node(&kids[1])
            }
            Assign => {
                self.node(&kids[0])?;
                self.push(Reg::Result);
                self.node(&kids[2])?;
                self.pop(Reg::Tmp5);
                self.program.push(Inst::Sw(Reg::Result, 0, Reg::Tmp5));
                Ok(())
            }
            If => self.if_else(node),
            While => self.while_loop(node),
            Println => self.println(node),
            Delete => self.delete(node),

            TestEq => self.equality(&kids[0], &kids[2], true),
            TestNe => self.equality(&kids[0], &kids[2], false),
            TestLt => self.ordering(&kids[0], &kids[2], false),
            TestGt => self.ordering(&kids[0], &kids[2], true),
            TestLe => self.or_equal(&kids[0], &kids[2], false),
            TestGe => self.or_equal(&kids[0], &kids[2], true),

            ExprTerm | TermFactor | FactorNum | FactorId | FactorNull => self.node(&kids[0]),
            FactorParen | LvalueParen => self.node(&kids[1]),
            ExprPlus => self.add(&kids[0], &kids[2]),
            ExprMinus => self.sub(&kids[0], &kids[2]),
            TermStar => {
                self.operands(&kids[0], &kids[2])?;
                self.program.push(Inst::Mult(Reg::Tmp5, Reg::Result));
                self.program.push(Inst::Mflo(Reg::Result));
                Ok(())
            }
            TermSlash => {
                self.operands(&kids[0], &kids[2])?;
                self.program.push(Inst::Div(Reg::Tmp5, Reg::Result));
                self.program.push(Inst::Mflo(Reg::Result));
                Ok(())
            }
            TermPct => {
                self.operands(&kids[0], &kids[2])?;
                self.program.push(Inst::Div(Reg::Tmp5, Reg::Result));
                self.program.push(Inst::Mfhi(Reg::Result));
                Ok(())
            }
            FactorAmp => self.node(&kids[1]),
            FactorStar => {
                self.node(&kids[1])?;
                self.program.push(Inst::Lw(Reg::Result, 0, Reg::Result));
                Ok(())
            }
            FactorNew => self.new_array(node),
            FactorCallEmpty | FactorCallArgs => self.call(node),

            // Lvalues leave an exact address in $3.
            LvalueId => {
                let offset = self.tables.binding(kids[0].lexeme())?.offset;
                self.lis(Reg::Tmp5, Word::Imm(offset.into()));
                self.program
                    .push(Inst::Add(Reg::Result, Reg::Fp, Reg::Tmp5));
                Ok(())
            }
            LvalueStar => self.node(&kids[1]),
        }
    }

    fn wain(&mut self, node: &Inner) -> Result<(), Error> {
        self.tables.push();
        debug!("translating wain");

        let dcl1 = &node.children[3];
        let dcl2 = &node.children[5];
        self.program.push(Inst::Label(Label::Proc("wain".into())));
        self.program.push(Inst::Sub(Reg::Fp, Reg::Sp, Reg::Four));
        match dcl1.children()[1].var_type() {
            VarType::IntStar => {
                // array mode: $1 base, $2 length
                self.push(Reg::Fp);
                self.push(Reg::Ra);
                self.call_runtime(Runtime::Init);
                self.pop(Reg::Ra);
                self.pop(Reg::Fp);
            }
            VarType::Int => {
                // twoints mode: $2 = 0 tells init there is no array
                self.push(Reg::Fp);
                self.push(Reg::Ra);
                self.push(Reg::Arg2);
                self.lis(Reg::Arg2, Word::Imm(0));
                self.call_runtime(Runtime::Init);
                self.pop(Reg::Arg2);
                self.pop(Reg::Ra);
                self.pop(Reg::Fp);
            }
        }

        // Parameters land at the local offsets the dcl handler assigns them.
        self.push(Reg::Arg1);
        self.node(dcl1)?;
        self.push(Reg::Arg2);
        self.node(dcl2)?;

        self.node(&node.children[8])?;
        self.node(&node.children[9])?;
        self.node(&node.children[11])?;
        self.program.push(Inst::Jr(Reg::Ra));

        self.tables.pop()
    }

    fn procedure(&mut self, node: &Inner) -> Result<(), Error> {
        self.tables.push();
        let name = node.children[1].lexeme();
        debug!("translating procedure {name}");

        self.program.push(Inst::Label(Label::Proc(name.into())));
        self.program.push(Inst::Sub(Reg::Fp, Reg::Sp, Reg::Four));
        self.node(&node.children[3])?;
        self.node(&node.children[6])?;
        // Saved registers go below the declarations so local offsets stay
        // contiguous with the parameter region.
        for reg in SAVED {
            self.push(reg);
        }
        self.node(&node.children[7])?;
        self.node(&node.children[9])?;
        for reg in SAVED.into_iter().rev() {
            self.pop(reg);
        }
        self.program.push(Inst::Jr(Reg::Ra));

        self.tables.pop()
    }

    /// Bind one parameter declaration; emits no code.
    fn param(&mut self, dcl: &Node) -> Result<(), Error> {
        let id = &dcl.children()[1];
        self.tables.insert_param(id.lexeme(), id.var_type())
    }

    fn call(&mut self, node: &Inner) -> Result<(), Error> {
        let label = Label::Proc(node.children[0].lexeme().into());
        self.push(Reg::Fp);
        self.push(Reg::Ra);

        let mut argc = 0;
        if node.production == Production::FactorCallArgs {
            let mut arglist = &node.children[2];
            loop {
                self.node(&arglist.children()[0])?;
                self.push(Reg::Result);
                argc += 1;
                match arglist {
                    Node::Inner(list) if list.production == Production::ArglistCons => {
                        arglist = &list.children[2];
                    }
                    _ => break,
                }
            }
        }

        self.lis(Reg::Tmp5, Word::Label(label));
        self.program.push(Inst::Jalr(Reg::Tmp5));
        for _ in 0..argc {
            self.pop(Reg::Tmp5);
        }
        self.pop(Reg::Ra);
        self.pop(Reg::Fp);
        Ok(())
    }

    fn add(&mut self, lhs: &Node, rhs: &Node) -> Result<(), Error> {
        match (lhs.var_type(), rhs.var_type()) {
            (VarType::Int, VarType::Int) => self.operands(lhs, rhs)?,
            (VarType::IntStar, VarType::Int) => {
                self.node(lhs)?;
                self.push(Reg::Result);
                self.node(rhs)?;
                self.scale();
                self.pop(Reg::Tmp5);
            }
            (VarType::Int, VarType::IntStar) => {
                self.node(lhs)?;
                self.scale();
                self.push(Reg::Result);
                self.node(rhs)?;
                self.pop(Reg::Tmp5);
            }
            (VarType::IntStar, VarType::IntStar) => {
                unreachable!("pointer + pointer is rejected upstream")
            }
        }
        self.program
            .push(Inst::Add(Reg::Result, Reg::Tmp5, Reg::Result));
        Ok(())
    }

    fn sub(&mut self, lhs: &Node, rhs: &Node) -> Result<(), Error> {
        match (lhs.var_type(), rhs.var_type()) {
            (VarType::Int, VarType::Int) => {
                self.operands(lhs, rhs)?;
                self.program
                    .push(Inst::Sub(Reg::Result, Reg::Tmp5, Reg::Result));
            }
            (VarType::IntStar, VarType::Int) => {
                self.node(lhs)?;
                self.push(Reg::Result);
                self.node(rhs)?;
                self.scale();
                self.pop(Reg::Tmp5);
                self.program
                    .push(Inst::Sub(Reg::Result, Reg::Tmp5, Reg::Result));
            }
            (VarType::IntStar, VarType::IntStar) => {
                // element count, not byte count
                self.operands(lhs, rhs)?;
                self.program
                    .push(Inst::Sub(Reg::Result, Reg::Tmp5, Reg::Result));
                self.program.push(Inst::Div(Reg::Result, Reg::Four));
                self.program.push(Inst::Mflo(Reg::Result));
            }
            (VarType::Int, VarType::IntStar) => {
                unreachable!("int - pointer is rejected upstream")
            }
        }
        Ok(())
    }

    fn ordering(&mut self, lhs: &Node, rhs: &Node, swapped: bool) -> Result<(), Error> {
        let ty = lhs.var_type();
        self.operands(lhs, rhs)?;
        self.program.push(if swapped {
            cmp(ty, Reg::Result, Reg::Result, Reg::Tmp5)
        } else {
            cmp(ty, Reg::Result, Reg::Tmp5, Reg::Result)
        });
        Ok(())
    }

    /// `lhs != rhs` as the sum of both strict orderings; `negate` turns it
    /// into equality via `1 - sum`.
    fn equality(&mut self, lhs: &Node, rhs: &Node, negate: bool) -> Result<(), Error> {
        let ty = lhs.var_type();
        self.operands(lhs, rhs)?;
        self.program
            .push(cmp(ty, Reg::Tmp6, Reg::Result, Reg::Tmp5));
        self.program
            .push(cmp(ty, Reg::Tmp7, Reg::Tmp5, Reg::Result));
        self.program
            .push(Inst::Add(Reg::Result, Reg::Tmp6, Reg::Tmp7));
        if negate {
            self.program
                .push(Inst::Sub(Reg::Result, Reg::One, Reg::Result));
        }
        Ok(())
    }

    /// `<=` / `>=` as strict ordering plus equality; both operands are
    /// evaluated twice, there is no short-circuiting anywhere.
    fn or_equal(&mut self, lhs: &Node, rhs: &Node, swapped: bool) -> Result<(), Error> {
        self.ordering(lhs, rhs, swapped)?;
        self.push(Reg::Result);
        self.equality(lhs, rhs, true)?;
        self.pop(Reg::Tmp5);
        self.program
            .push(Inst::Add(Reg::Result, Reg::Tmp5, Reg::Result));
        Ok(())
    }

    fn if_else(&mut self, node: &Inner) -> Result<(), Error> {
        let else_label = Label::Else(self.fresh());
        let endif_label = Label::Endif(self.fresh());
        self.node(&node.children[2])?;
        self.program.push(Inst::Beq(
            Reg::Result,
            Reg::Zero,
            BranchTarget::Label(else_label.clone()),
        ));
        self.node(&node.children[5])?;
        self.program.push(Inst::Beq(
            Reg::Zero,
            Reg::Zero,
            BranchTarget::Label(endif_label.clone()),
        ));
        self.program.push(Inst::Label(else_label));
        self.node(&node.children[9])?;
        self.program.push(Inst::Label(endif_label));
        Ok(())
    }

    fn while_loop(&mut self, node: &Inner) -> Result<(), Error> {
        let loop_label = Label::Loop(self.fresh());
        let end_label = Label::EndWhile(self.fresh());
        self.program.push(Inst::Label(loop_label.clone()));
        self.node(&node.children[2])?;
        self.program.push(Inst::Beq(
            Reg::Result,
            Reg::Zero,
            BranchTarget::Label(end_label.clone()),
        ));
        self.node(&node.children[5])?;
        self.program
            .push(Inst::Beq(Reg::Zero, Reg::Zero, BranchTarget::Label(loop_label)));
        self.program.push(Inst::Label(end_label));
        Ok(())
    }

    fn println(&mut self, node: &Inner) -> Result<(), Error> {
        self.node(&node.children[2])?;
        self.push(Reg::Result);
        self.pop(Reg::Arg1);
        self.push(Reg::Ra);
        self.push(Reg::Fp);
        self.program.push(Inst::Jalr(Reg::PrintAddr));
        self.pop(Reg::Fp);
        self.pop(Reg::Ra);
        Ok(())
    }

    fn new_array(&mut self, node: &Inner) -> Result<(), Error> {
        self.node(&node.children[3])?;
        self.push(Reg::Result);
        self.pop(Reg::Arg1);
        self.push(Reg::Ra);
        self.push(Reg::Fp);
        self.call_runtime(Runtime::New);
        self.pop(Reg::Fp);
        self.pop(Reg::Ra);
        // On failure new returns 0; the branch skips exactly the two words
        // below, so they must stay adjacent.
        self.program
            .push(Inst::Bne(Reg::Result, Reg::Zero, BranchTarget::Words(2)));
        self.lis(Reg::Result, Word::Imm(NULL_PTR));
        Ok(())
    }

    fn delete(&mut self, node: &Inner) -> Result<(), Error> {
        let skip = Label::SkipDelete(self.fresh());
        self.node(&node.children[3])?;
        self.lis(Reg::Tmp5, Word::Imm(NULL_PTR));
        self.program.push(Inst::Beq(
            Reg::Result,
            Reg::Tmp5,
            BranchTarget::Label(skip.clone()),
        ));
        self.push(Reg::Result);
        self.pop(Reg::Arg1);
        self.push(Reg::Ra);
        self.push(Reg::Fp);
        self.call_runtime(Runtime::Delete);
        self.pop(Reg::Fp);
        self.pop(Reg::Ra);
        self.program.push(Inst::Label(skip));
        Ok(())
    }

    /// Left operand, push, right operand, pop the left into `$5`.
    fn operands(&mut self, lhs: &Node, rhs: &Node) -> Result<(), Error> {
        self.node(lhs)?;
        self.push(Reg::Result);
        self.node(rhs)?;
        self.pop(Reg::Tmp5);
        Ok(())
    }

    /// Multiply `$3` by the word size for pointer arithmetic.
    fn scale(&mut self) {
        self.program.push(Inst::Mult(Reg::Result, Reg::Four));
        self.program.push(Inst::Mflo(Reg::Result));
    }

    fn lis(&mut self, reg: Reg, word: Word) {
        self.program.push(Inst::Lis(reg));
        self.program.push(Inst::Word(word));
    }

    fn call_runtime(&mut self, entry: Runtime) {
        self.lis(Reg::Tmp5, Word::Runtime(entry));
        self.program.push(Inst::Jalr(Reg::Tmp5));
    }

    fn push(&mut self, reg: Reg) {
        self.program.push(Inst::Sw(reg, -4, Reg::Sp));
        self.program.push(Inst::Sub(Reg::Sp, Reg::Sp, Reg::Four));
    }

    fn pop(&mut self, reg: Reg) {
        self.program.push(Inst::Add(Reg::Sp, Reg::Sp, Reg::Four));
        self.program.push(Inst::Lw(reg, -4, Reg::Sp));
    }

    fn fresh(&mut self) -> u64 {
        let n = self.labels;
        self.labels += 1;
        n
    }
}
