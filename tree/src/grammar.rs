use std::collections::HashMap;

static WLP4_CFG: &str = include_str!("wlp4.cfg");

/// One variant per rule of the grammar. Interior parse-tree nodes are tagged
/// with their rule at load time so the emitter never dispatches on strings.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Production {
    Start,
    ProceduresChain,
    ProceduresMain,
    Procedure,
    Main,
    ParamsEmpty,
    ParamsList,
    ParamLast,
    ParamCons,
    TypeInt,
    TypeIntStar,
    DclsEmpty,
    DclsNum,
    DclsNull,
    Dcl,
    StatementsEmpty,
    StatementsChain,
    Assign,
    If,
    While,
    Println,
    Delete,
    TestEq,
    TestNe,
    TestLt,
    TestLe,
    TestGe,
    TestGt,
    ExprTerm,
    ExprPlus,
    ExprMinus,
    TermFactor,
    TermStar,
    TermSlash,
    TermPct,
    FactorId,
    FactorNum,
    FactorNull,
    FactorParen,
    FactorAmp,
    FactorStar,
    FactorNew,
    FactorCallEmpty,
    FactorCallArgs,
    ArglistLast,
    ArglistCons,
    LvalueId,
    LvalueStar,
    LvalueParen,
}

impl Production {
    pub const ALL: [Self; 49] = [
        Self::Start,
        Self::ProceduresChain,
        Self::ProceduresMain,
        Self::Procedure,
        Self::Main,
        Self::ParamsEmpty,
        Self::ParamsList,
        Self::ParamLast,
        Self::ParamCons,
        Self::TypeInt,
        Self::TypeIntStar,
        Self::DclsEmpty,
        Self::DclsNum,
        Self::DclsNull,
        Self::Dcl,
        Self::StatementsEmpty,
        Self::StatementsChain,
        Self::Assign,
        Self::If,
        Self::While,
        Self::Println,
        Self::Delete,
        Self::TestEq,
        Self::TestNe,
        Self::TestLt,
        Self::TestLe,
        Self::TestGe,
        Self::TestGt,
        Self::ExprTerm,
        Self::ExprPlus,
        Self::ExprMinus,
        Self::TermFactor,
        Self::TermStar,
        Self::TermSlash,
        Self::TermPct,
        Self::FactorId,
        Self::FactorNum,
        Self::FactorNull,
        Self::FactorParen,
        Self::FactorAmp,
        Self::FactorStar,
        Self::FactorNew,
        Self::FactorCallEmpty,
        Self::FactorCallArgs,
        Self::ArglistLast,
        Self::ArglistCons,
        Self::LvalueId,
        Self::LvalueStar,
        Self::LvalueParen,
    ];

    /// The canonical `LHS RHS1 RHS2 …` spelling, single-space separated.
    pub const fn text(self) -> &'static str {
        match self {
            Self::Start => "start BOF procedures EOF",
            Self::ProceduresChain => "procedures procedure procedures",
            Self::ProceduresMain => "procedures main",
            Self::Procedure => {
                "procedure INT ID LPAREN params RPAREN LBRACE dcls statements RETURN expr SEMI RBRACE"
            }
            Self::Main => {
                "main INT WAIN LPAREN dcl COMMA dcl RPAREN LBRACE dcls statements RETURN expr SEMI RBRACE"
            }
            Self::ParamsEmpty => "params .EMPTY",
            Self::ParamsList => "params paramlist",
            Self::ParamLast => "paramlist dcl",
            Self::ParamCons => "paramlist dcl COMMA paramlist",
            Self::TypeInt => "type INT",
            Self::TypeIntStar => "type INT STAR",
            Self::DclsEmpty => "dcls .EMPTY",
            Self::DclsNum => "dcls dcls dcl BECOMES NUM SEMI",
            Self::DclsNull => "dcls dcls dcl BECOMES NULL SEMI",
            Self::Dcl => "dcl type ID",
            Self::StatementsEmpty => "statements .EMPTY",
            Self::StatementsChain => "statements statements statement",
            Self::Assign => "statement lvalue BECOMES expr SEMI",
            Self::If => {
                "statement IF LPAREN test RPAREN LBRACE statements RBRACE ELSE LBRACE statements RBRACE"
            }
            Self::While => "statement WHILE LPAREN test RPAREN LBRACE statements RBRACE",
            Self::Println => "statement PRINTLN LPAREN expr RPAREN SEMI",
            Self::Delete => "statement DELETE LBRACK RBRACK expr SEMI",
            Self::TestEq => "test expr EQ expr",
            Self::TestNe => "test expr NE expr",
            Self::TestLt => "test expr LT expr",
            Self::TestLe => "test expr LE expr",
            Self::TestGe => "test expr GE expr",
            Self::TestGt => "test expr GT expr",
            Self::ExprTerm => "expr term",
            Self::ExprPlus => "expr expr PLUS term",
            Self::ExprMinus => "expr expr MINUS term",
            Self::TermFactor => "term factor",
            Self::TermStar => "term term STAR factor",
            Self::TermSlash => "term term SLASH factor",
            Self::TermPct => "term term PCT factor",
            Self::FactorId => "factor ID",
            Self::FactorNum => "factor NUM",
            Self::FactorNull => "factor NULL",
            Self::FactorParen => "factor LPAREN expr RPAREN",
            Self::FactorAmp => "factor AMP lvalue",
            Self::FactorStar => "factor STAR factor",
            Self::FactorNew => "factor NEW INT LBRACK expr RBRACK",
            Self::FactorCallEmpty => "factor ID LPAREN RPAREN",
            Self::FactorCallArgs => "factor ID LPAREN arglist RPAREN",
            Self::ArglistLast => "arglist expr",
            Self::ArglistCons => "arglist expr COMMA arglist",
            Self::LvalueId => "lvalue ID",
            Self::LvalueStar => "lvalue STAR factor",
            Self::LvalueParen => "lvalue LPAREN lvalue RPAREN",
        }
    }

    /// Number of right-hand-side symbols, which is also the child count of a
    /// node tagged with this rule (`.EMPTY` counts as a sentinel child).
    pub fn arity(self) -> usize {
        self.text().split_whitespace().count() - 1
    }
}

/// The set of legal productions, keyed by their canonical spelling. Built
/// from the embedded grammar description; answers "is this line an
/// interior-node header?" during tree loading.
pub struct Registry(HashMap<&'static str, Production>);

impl Registry {
    pub fn wlp4() -> Self {
        let mut lines = WLP4_CFG.lines();
        lines.next(); // ".CFG" header
        let rules = lines
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                let rule = Production::ALL
                    .into_iter()
                    .find(|rule| rule.text() == line)
                    .expect("embedded grammar rule without a Production variant");
                (rule.text(), rule)
            })
            .collect();
        Self(rules)
    }

    pub fn lookup(&self, line: &str) -> Option<Production> {
        self.0.get(line).copied()
    }
}
