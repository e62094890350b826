//! End-to-end checks: serialized annotated trees in, assembly text out.

use pretty_assertions::assert_eq;
use tree::Registry;
use wlp4gen::{codegen, parse};

fn assemble(tree: &str) -> String {
    let registry = Registry::wlp4();
    let root = parse::load(tree.as_bytes(), &registry).expect("tree loads");
    let bytes = codegen::generate(&root).expect("codegen succeeds");
    String::from_utf8(bytes.into_vec()).expect("assembly is ascii")
}

/// A `wain`-only program. The first parameter is `a` (`int` or `int*`), the
/// second is `b: int`; the fragments are preorder-serialized subtrees.
fn wain_program(pointer_mode: bool, dcls: &str, statements: &str, ret: &str) -> String {
    let dcl1 = if pointer_mode {
        "dcl type ID\ntype INT STAR\nINT int\nSTAR *\nID a : int*"
    } else {
        "dcl type ID\ntype INT\nINT int\nID a : int"
    };
    format!(
        "start BOF procedures EOF\n\
         BOF BOF\n\
         procedures main\n\
         main INT WAIN LPAREN dcl COMMA dcl RPAREN LBRACE dcls statements RETURN expr SEMI RBRACE\n\
         INT int\n\
         WAIN wain\n\
         LPAREN (\n\
         {dcl1}\n\
         COMMA ,\n\
         dcl type ID\ntype INT\nINT int\nID b : int\n\
         RPAREN )\n\
         LBRACE {{\n\
         {dcls}\n\
         {statements}\n\
         RETURN return\n\
         {ret}\n\
         SEMI ;\n\
         RBRACE }}\n\
         EOF EOF\n"
    )
}

const EMPTY_DCLS: &str = "dcls .EMPTY";
const EMPTY_STATEMENTS: &str = "statements .EMPTY";
const RETURN_A_INT: &str = "expr term : int\nterm factor : int\nfactor ID : int\nID a : int";

const IF_A_LT_B: &str = "\
statement IF LPAREN test RPAREN LBRACE statements RBRACE ELSE LBRACE statements RBRACE
IF if
LPAREN (
test expr LT expr
expr term : int
term factor : int
factor ID : int
ID a : int
LT <
expr term : int
term factor : int
factor ID : int
ID b : int
RPAREN )
LBRACE {
statements .EMPTY
RBRACE }
ELSE else
LBRACE {
statements .EMPTY
RBRACE }";

#[test]
fn minimal_wain_matches_expected_output() {
    let out = assemble(&wain_program(
        false,
        EMPTY_DCLS,
        EMPTY_STATEMENTS,
        RETURN_A_INT,
    ));
    let expected = "\
.import print
.import init
.import new
.import delete
lis $4
.word 4
lis $10
.word print
lis $11
.word 1
beq $0, $0, Fwain
Fwain:
sub $29, $30, $4
sw $29, -4($30)
sub $30, $30, $4
sw $31, -4($30)
sub $30, $30, $4
sw $2, -4($30)
sub $30, $30, $4
lis $2
.word 0
lis $5
.word init
jalr $5
add $30, $30, $4
lw $2, -4($30)
add $30, $30, $4
lw $31, -4($30)
add $30, $30, $4
lw $29, -4($30)
sw $1, -4($30)
sub $30, $30, $4
sw $2, -4($30)
sub $30, $30, $4
lw $3, 0($29)
jr $31
";
    assert_eq!(out, expected);
}

#[test]
fn pointer_mode_wain_calls_init_without_clearing_arg2() {
    let ret = "expr term : int*\nterm factor : int*\nfactor ID : int*\nID a : int*";
    let out = assemble(&wain_program(true, EMPTY_DCLS, EMPTY_STATEMENTS, ret));
    let init_call = "\
Fwain:
sub $29, $30, $4
sw $29, -4($30)
sub $30, $30, $4
sw $31, -4($30)
sub $30, $30, $4
lis $5
.word init
jalr $5
add $30, $30, $4
lw $31, -4($30)
add $30, $30, $4
lw $29, -4($30)
";
    assert!(out.contains(init_call), "missing array-mode init:\n{out}");
    assert!(!out.contains(".word 0\n"), "twoints marker emitted:\n{out}");
}

#[test]
fn pointer_add_scales_the_integer_operand() {
    let ret = "\
expr expr PLUS term : int*
expr term : int*
term factor : int*
factor ID : int*
ID a : int*
PLUS +
term factor : int
factor NUM : int
NUM 1";
    let out = assemble(&wain_program(true, EMPTY_DCLS, EMPTY_STATEMENTS, ret));
    let sum = "\
lw $3, 0($29)
sw $3, -4($30)
sub $30, $30, $4
lis $3
.word 1
mult $3, $4
mflo $3
add $30, $30, $4
lw $5, -4($30)
add $3, $5, $3
jr $31
";
    assert!(out.contains(sum), "missing scaled add:\n{out}");
}

#[test]
fn pointer_difference_divides_by_the_word_size() {
    let ret = "\
expr expr MINUS term : int
expr term : int*
term factor : int*
factor ID : int*
ID a : int*
MINUS -
term factor : int*
factor ID : int*
ID a : int*";
    let out = assemble(&wain_program(true, EMPTY_DCLS, EMPTY_STATEMENTS, ret));
    assert!(
        out.contains("sub $3, $5, $3\ndiv $3, $4\nmflo $3\n"),
        "missing element-count division:\n{out}"
    );
}

#[test]
fn sequential_ifs_share_the_label_counter() {
    let statements = format!(
        "statements statements statement\nstatements statements statement\nstatements .EMPTY\n{IF_A_LT_B}\n{IF_A_LT_B}"
    );
    let out = assemble(&wain_program(
        false,
        EMPTY_DCLS,
        &statements,
        RETURN_A_INT,
    ));
    let positions: Vec<usize> = ["Felse0:", "Fendif1:", "Felse2:", "Fendif3:"]
        .iter()
        .map(|label| out.find(label).unwrap_or_else(|| panic!("missing {label}")))
        .collect();
    assert!(
        positions.windows(2).all(|pair| pair[0] < pair[1]),
        "labels out of order:\n{out}"
    );
    assert!(out.contains("beq $3, $0, Felse0\n"));
    assert!(out.contains("beq $0, $0, Fendif3\n"));
}

#[test]
fn while_loops_branch_back_to_their_own_head() {
    let statements = "\
statement WHILE LPAREN test RPAREN LBRACE statements RBRACE
WHILE while
LPAREN (
test expr LT expr
expr term : int
term factor : int
factor ID : int
ID a : int
LT <
expr term : int
term factor : int
factor ID : int
ID b : int
RPAREN )
LBRACE {
statements .EMPTY
RBRACE }";
    let out = assemble(&wain_program(
        false,
        EMPTY_DCLS,
        statements,
        RETURN_A_INT,
    ));
    assert!(out.contains("Floop0:\n"));
    assert!(out.contains("beq $3, $0, Fendwhile1\n"));
    assert!(out.contains("beq $0, $0, Floop0\nFendwhile1:\n"));
}

#[test]
fn comparison_encodings_follow_operand_types() {
    // a == b over ints: both orderings summed, then negated via $11.
    let eq_statements = "\
statement IF LPAREN test RPAREN LBRACE statements RBRACE ELSE LBRACE statements RBRACE
IF if
LPAREN (
test expr EQ expr
expr term : int
term factor : int
factor ID : int
ID a : int
EQ ==
expr term : int
term factor : int
factor ID : int
ID b : int
RPAREN )
LBRACE {
statements .EMPTY
RBRACE }
ELSE else
LBRACE {
statements .EMPTY
RBRACE }";
    let out = assemble(&wain_program(
        false,
        EMPTY_DCLS,
        eq_statements,
        RETURN_A_INT,
    ));
    assert!(out.contains(
        "slt $6, $3, $5\nslt $7, $5, $3\nadd $3, $6, $7\nsub $3, $11, $3\n"
    ));

    // a != a over pointers: unsigned comparison, no negation.
    let ne_statements = "\
statement IF LPAREN test RPAREN LBRACE statements RBRACE ELSE LBRACE statements RBRACE
IF if
LPAREN (
test expr NE expr
expr term : int*
term factor : int*
factor ID : int*
ID a : int*
NE !=
expr term : int*
term factor : int*
factor ID : int*
ID a : int*
RPAREN )
LBRACE {
statements .EMPTY
RBRACE }
ELSE else
LBRACE {
statements .EMPTY
RBRACE }";
    let ret = "expr term : int*\nterm factor : int*\nfactor ID : int*\nID a : int*";
    let out = assemble(&wain_program(true, EMPTY_DCLS, ne_statements, ret));
    assert!(out.contains("sltu $6, $3, $5\nsltu $7, $5, $3\nadd $3, $6, $7\n"));
    assert!(!out.contains("sub $3, $11, $3\n"));
}

#[test]
fn delete_skips_the_null_sentinel() {
    let statements = "\
statement DELETE LBRACK RBRACK expr SEMI
DELETE delete
LBRACK [
RBRACK ]
expr term : int*
term factor : int*
factor ID : int*
ID a : int*
SEMI ;";
    let ret = "expr term : int\nterm factor : int\nfactor ID : int\nID b : int";
    let out = assemble(&wain_program(true, EMPTY_DCLS, statements, ret));
    assert!(out.contains(
        "lis $5\n.word 69\nbeq $3, $5, FskipDelete0\n"
    ));
    assert!(out.contains("lis $5\n.word delete\njalr $5\n"));
    assert_eq!(out.matches("FskipDelete0:").count(), 1);
}

#[test]
fn allocation_failure_resets_to_the_null_sentinel() {
    let ret = "\
expr term : int*
term factor : int*
factor NEW INT LBRACK expr RBRACK : int*
NEW new
INT int
LBRACK [
expr term : int
term factor : int
factor ID : int
ID b : int
RBRACK ]";
    let out = assemble(&wain_program(true, EMPTY_DCLS, EMPTY_STATEMENTS, ret));
    assert!(out.contains("lis $5\n.word new\njalr $5\n"));
    assert!(out.contains("bne $3, $0, 2\nlis $3\n.word 69\n"));
}

#[test]
fn initialized_locals_land_below_the_parameters() {
    let dcls = "\
dcls dcls dcl BECOMES NULL SEMI
dcls dcls dcl BECOMES NUM SEMI
dcls .EMPTY
dcl type ID
type INT
INT int
ID x : int
BECOMES =
NUM 5
SEMI ;
dcl type ID
type INT STAR
INT int
STAR *
ID p : int*
BECOMES =
NULL NULL
SEMI ;";
    let ret = "expr term : int\nterm factor : int\nfactor ID : int\nID x : int";
    let out = assemble(&wain_program(false, dcls, EMPTY_STATEMENTS, ret));
    // x = 5 then p = NULL, each pushed into its slot in declaration order
    assert!(out.contains(
        "lis $3\n.word 5\nsw $3, -4($30)\nsub $30, $30, $4\nlis $3\n.word 69\nsw $3, -4($30)\nsub $30, $30, $4\n"
    ));
    // a@0, b@-4, so x sits at -8
    assert!(out.contains("lw $3, -8($29)\njr $31\n"));
}

#[test]
fn assignment_stores_through_the_lvalue_address() {
    let dcls = "\
dcls dcls dcl BECOMES NUM SEMI
dcls .EMPTY
dcl type ID
type INT
INT int
ID x : int
BECOMES =
NUM 5
SEMI ;";
    let statements = "\
statement lvalue BECOMES expr SEMI
lvalue ID : int
ID x : int
BECOMES =
expr term : int
term factor : int
factor NUM : int
NUM 7
SEMI ;";
    let out = assemble(&wain_program(false, dcls, statements, RETURN_A_INT));
    assert!(out.contains(
        "lis $5\n.word -8\nadd $3, $29, $5\nsw $3, -4($30)\nsub $30, $30, $4\nlis $3\n.word 7\nadd $30, $30, $4\nlw $5, -4($30)\nsw $3, 0($5)\n"
    ));
}

#[test]
fn dereference_loads_through_the_pointer() {
    let ret = "\
expr term : int
term factor : int
factor STAR factor : int
STAR *
factor ID : int*
ID a : int*";
    let out = assemble(&wain_program(true, EMPTY_DCLS, EMPTY_STATEMENTS, ret));
    assert!(out.contains("lw $3, 0($29)\nlw $3, 0($3)\njr $31\n"));
}

/// `int f(int a, int b, int c) { return a; }` called as `f(1, 2, 3)`.
const PROCEDURE_PROGRAM: &str = "\
start BOF procedures EOF
BOF BOF
procedures procedure procedures
procedure INT ID LPAREN params RPAREN LBRACE dcls statements RETURN expr SEMI RBRACE
INT int
ID f
LPAREN (
params paramlist
paramlist dcl COMMA paramlist
dcl type ID
type INT
INT int
ID a : int
COMMA ,
paramlist dcl COMMA paramlist
dcl type ID
type INT
INT int
ID b : int
COMMA ,
paramlist dcl
dcl type ID
type INT
INT int
ID c : int
RPAREN )
LBRACE {
dcls .EMPTY
statements .EMPTY
RETURN return
expr term : int
term factor : int
factor ID : int
ID a : int
SEMI ;
RBRACE }
procedures main
main INT WAIN LPAREN dcl COMMA dcl RPAREN LBRACE dcls statements RETURN expr SEMI RBRACE
INT int
WAIN wain
LPAREN (
dcl type ID
type INT
INT int
ID x : int
COMMA ,
dcl type ID
type INT
INT int
ID y : int
RPAREN )
LBRACE {
dcls .EMPTY
statements .EMPTY
RETURN return
expr term : int
term factor : int
factor ID LPAREN arglist RPAREN : int
ID f
LPAREN (
arglist expr COMMA arglist
expr term : int
term factor : int
factor NUM : int
NUM 1
COMMA ,
arglist expr COMMA arglist
expr term : int
term factor : int
factor NUM : int
NUM 2
COMMA ,
arglist expr
expr term : int
term factor : int
factor NUM : int
NUM 3
RPAREN )
SEMI ;
RBRACE }
EOF EOF
";

#[test]
fn leftmost_parameter_gets_the_deepest_offset() {
    let out = assemble(PROCEDURE_PROGRAM);
    assert!(out.contains("Ff:\nsub $29, $30, $4\n"));
    // a@12, b@8, c@4 after inversion; the body returns a
    assert!(out.contains("lw $3, 12($29)\n"));
}

#[test]
fn procedures_save_and_restore_scratch_registers() {
    let out = assemble(PROCEDURE_PROGRAM);
    let saves = "\
sw $1, -4($30)
sub $30, $30, $4
sw $2, -4($30)
sub $30, $30, $4
sw $5, -4($30)
sub $30, $30, $4
sw $6, -4($30)
sub $30, $30, $4
sw $7, -4($30)
sub $30, $30, $4
";
    let restores = "\
add $30, $30, $4
lw $7, -4($30)
add $30, $30, $4
lw $6, -4($30)
add $30, $30, $4
lw $5, -4($30)
add $30, $30, $4
lw $2, -4($30)
add $30, $30, $4
lw $1, -4($30)
jr $31
";
    assert!(out.contains(saves), "missing register saves:\n{out}");
    assert!(out.contains(restores), "missing register restores:\n{out}");
}

#[test]
fn call_sites_push_arguments_and_discard_their_slots() {
    let out = assemble(PROCEDURE_PROGRAM);
    let call = "\
lis $3
.word 3
sw $3, -4($30)
sub $30, $30, $4
lis $5
.word Ff
jalr $5
add $30, $30, $4
lw $5, -4($30)
add $30, $30, $4
lw $5, -4($30)
add $30, $30, $4
lw $5, -4($30)
add $30, $30, $4
lw $31, -4($30)
add $30, $30, $4
lw $29, -4($30)
";
    assert!(out.contains(call), "missing call sequence:\n{out}");
}

#[test]
fn println_preserves_frame_and_link_registers() {
    let statements = "\
statement PRINTLN LPAREN expr RPAREN SEMI
PRINTLN println
LPAREN (
expr term : int
term factor : int
factor ID : int
ID b : int
RPAREN )
SEMI ;";
    let out = assemble(&wain_program(
        false,
        EMPTY_DCLS,
        statements,
        RETURN_A_INT,
    ));
    let print_call = "\
sw $31, -4($30)
sub $30, $30, $4
sw $29, -4($30)
sub $30, $30, $4
jalr $10
add $30, $30, $4
lw $29, -4($30)
add $30, $30, $4
lw $31, -4($30)
";
    assert!(out.contains(print_call), "missing print call:\n{out}");
}

#[test]
fn pushes_and_pops_stay_balanced() {
    let out = assemble(PROCEDURE_PROGRAM);
    let pushes = out.lines().filter(|line| *line == "sub $30, $30, $4").count();
    let pops = out.lines().filter(|line| *line == "add $30, $30, $4").count();
    assert_eq!(pushes, pops);
}

#[test]
fn every_label_is_defined_once() {
    let statements = format!(
        "statements statements statement\nstatements statements statement\nstatements .EMPTY\n{IF_A_LT_B}\n{IF_A_LT_B}"
    );
    let out = assemble(&wain_program(
        false,
        EMPTY_DCLS,
        &statements,
        RETURN_A_INT,
    ));
    let mut defined: Vec<&str> = out
        .lines()
        .filter(|line| line.ends_with(':'))
        .collect();
    defined.sort_unstable();
    let before = defined.len();
    defined.dedup();
    assert_eq!(before, defined.len(), "duplicate label definition:\n{out}");
}

#[test]
fn output_is_deterministic() {
    let program = wain_program(false, EMPTY_DCLS, EMPTY_STATEMENTS, RETURN_A_INT);
    assert_eq!(assemble(&program), assemble(&program));
}

#[test]
fn unbound_identifiers_abort_generation() {
    let ret = "expr term : int\nterm factor : int\nfactor ID : int\nID ghost : int";
    let program = wain_program(false, EMPTY_DCLS, EMPTY_STATEMENTS, ret);
    let root = parse::load(program.as_bytes(), &Registry::wlp4()).expect("tree loads");
    match codegen::generate(&root) {
        Err(codegen::Error::Unbound(id)) => assert_eq!(id, "ghost"),
        other => panic!("expected an unbound-identifier error, got {other:?}"),
    }
}
