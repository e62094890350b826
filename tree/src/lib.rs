//! The annotated parse tree the code generator consumes: tokens, node shapes
//! and the `int` / `int*` type annotations attached upstream.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

pub mod grammar;
pub use grammar::{Production, Registry};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VarType {
    Int,
    IntStar,
}

#[derive(Debug, Error)]
#[error("type annotation must be int or int*")]
pub struct BadType;

impl FromStr for VarType {
    type Err = BadType;
    fn from_str(s: &str) -> Result<Self, BadType> {
        match s {
            "int" => Ok(Self::Int),
            "int*" => Ok(Self::IntStar),
            _ => Err(BadType),
        }
    }
}

impl Display for VarType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
            Self::IntStar => "int*",
        })
    }
}

/// Terminal symbols of the grammar, plus the `.EMPTY` sentinel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Id,
    Num,
    Null,
    Int,
    Wain,
    If,
    Else,
    While,
    Println,
    Return,
    New,
    Delete,
    Lparen,
    Rparen,
    Lbrace,
    Rbrace,
    Lbrack,
    Rbrack,
    Becomes,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Pct,
    Amp,
    Comma,
    Semi,
    Bof,
    Eof,
    Empty,
}

impl TokenKind {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "ID" => Self::Id,
            "NUM" => Self::Num,
            "NULL" => Self::Null,
            "INT" => Self::Int,
            "WAIN" => Self::Wain,
            "IF" => Self::If,
            "ELSE" => Self::Else,
            "WHILE" => Self::While,
            "PRINTLN" => Self::Println,
            "RETURN" => Self::Return,
            "NEW" => Self::New,
            "DELETE" => Self::Delete,
            "LPAREN" => Self::Lparen,
            "RPAREN" => Self::Rparen,
            "LBRACE" => Self::Lbrace,
            "RBRACE" => Self::Rbrace,
            "LBRACK" => Self::Lbrack,
            "RBRACK" => Self::Rbrack,
            "BECOMES" => Self::Becomes,
            "EQ" => Self::Eq,
            "NE" => Self::Ne,
            "LT" => Self::Lt,
            "GT" => Self::Gt,
            "LE" => Self::Le,
            "GE" => Self::Ge,
            "PLUS" => Self::Plus,
            "MINUS" => Self::Minus,
            "STAR" => Self::Star,
            "SLASH" => Self::Slash,
            "PCT" => Self::Pct,
            "AMP" => Self::Amp,
            "COMMA" => Self::Comma,
            "SEMI" => Self::Semi,
            "BOF" => Self::Bof,
            "EOF" => Self::Eof,
            ".EMPTY" => Self::Empty,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Box<str>,
}

/// An owning parse tree; every node owns its children by value.
#[derive(Debug)]
pub enum Node {
    Inner(Inner),
    Leaf(Leaf),
}

#[derive(Debug)]
pub struct Inner {
    pub production: Production,
    pub children: Box<[Node]>,
    pub ty: Option<VarType>,
}

#[derive(Debug)]
pub struct Leaf {
    pub token: Token,
    pub ty: Option<VarType>,
}

impl Node {
    /// The `.EMPTY` sentinel standing in for an absent structural child.
    pub fn empty() -> Self {
        Self::Leaf(Leaf {
            token: Token {
                kind: TokenKind::Empty,
                lexeme: "".into(),
            },
            ty: None,
        })
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Self::Inner(inner) => &inner.children,
            Self::Leaf(_) => &[],
        }
    }

    pub fn ty(&self) -> Option<VarType> {
        match self {
            Self::Inner(inner) => inner.ty,
            Self::Leaf(leaf) => leaf.ty,
        }
    }

    /// Annotated type of an expression node. Absence means the upstream type
    /// checker failed to decorate the tree, which is a bug, not an input error.
    pub fn var_type(&self) -> VarType {
        match self.ty() {
            Some(ty) => ty,
            None => unreachable!("expression node without a type annotation"),
        }
    }

    pub fn token(&self) -> &Token {
        match self {
            Self::Leaf(leaf) => &leaf.token,
            Self::Inner(_) => unreachable!("token() on an interior node"),
        }
    }

    pub fn lexeme(&self) -> &str {
        &self.token().lexeme
    }
}

impl Leaf {
    pub fn lexeme(&self) -> &str {
        &self.token.lexeme
    }

    /// Value of a `NUM` token. The loader validates the lexeme, so a parse
    /// failure here cannot happen on a tree it produced.
    pub fn num(&self) -> i64 {
        match self.token.lexeme.parse() {
            Ok(n) => n,
            Err(_) => unreachable!("NUM lexeme validated by the loader"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_type_round_trips() {
        assert_eq!("int".parse::<VarType>().unwrap(), VarType::Int);
        assert_eq!("int*".parse::<VarType>().unwrap(), VarType::IntStar);
        assert_eq!(VarType::Int.to_string(), "int");
        assert_eq!(VarType::IntStar.to_string(), "int*");
        assert!("int**".parse::<VarType>().is_err());
    }

    #[test]
    fn token_kinds_resolve() {
        assert_eq!(TokenKind::from_symbol("NUM"), Some(TokenKind::Num));
        assert_eq!(TokenKind::from_symbol(".EMPTY"), Some(TokenKind::Empty));
        assert_eq!(TokenKind::from_symbol("expr"), None);
    }

    #[test]
    fn empty_sentinel_has_no_children() {
        let node = Node::empty();
        assert!(node.children().is_empty());
        assert_eq!(node.token().kind, TokenKind::Empty);
    }
}
