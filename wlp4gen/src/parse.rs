//! Loader for the line-oriented serialization of the annotated parse tree.
//!
//! Each line is either an interior-node header (`LHS RHS1 RHS2 …`) or a
//! terminal (`KIND LEXEME`), optionally suffixed with a `: int` / `: int*`
//! annotation. Interior headers are recognized by membership in the
//! production registry; everything else must be a terminal.

use log::debug;
use std::io::{self, BufRead};
use thiserror::Error;
use tree::{Inner, Leaf, Node, Registry, Token, TokenKind, VarType};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unrecognized line: {0:?}")]
    Unrecognized(String),
    #[error("bad type annotation: {0:?}")]
    BadType(String),
    #[error("bad number literal: {0:?}")]
    BadNumber(String),
}

pub fn load(reader: impl BufRead, registry: &Registry) -> Result<Node, Error> {
    let mut lines = reader.lines();
    let root = node(&mut lines, registry)?;
    debug!("parse tree loaded");
    Ok(root)
}

fn node(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    registry: &Registry,
) -> Result<Node, Error> {
    let line = lines.next().ok_or(Error::UnexpectedEof)??;
    let mut fields: Vec<&str> = line.split_whitespace().collect();

    let mut ty = None;
    if let [.., colon, annotation] = fields.as_slice() {
        if *colon == ":" {
            ty = Some(
                annotation
                    .parse::<VarType>()
                    .map_err(|_| Error::BadType(line.clone()))?,
            );
            fields.truncate(fields.len() - 2);
        }
    }

    if let Some(production) = registry.lookup(&fields.join(" ")) {
        let mut children = Vec::with_capacity(fields.len() - 1);
        for &symbol in &fields[1..] {
            children.push(if symbol == ".EMPTY" {
                Node::empty()
            } else {
                node(lines, registry)?
            });
        }
        Ok(Node::Inner(Inner {
            production,
            children: children.into(),
            ty,
        }))
    } else {
        let [symbol, lexeme] = fields.as_slice() else {
            return Err(Error::Unrecognized(line.clone()));
        };
        let kind =
            TokenKind::from_symbol(symbol).ok_or_else(|| Error::Unrecognized(line.clone()))?;
        if kind == TokenKind::Num && lexeme.parse::<i64>().is_err() {
            return Err(Error::BadNumber(line.clone()));
        }
        Ok(Node::Leaf(Leaf {
            token: Token {
                kind,
                lexeme: (*lexeme).into(),
            },
            ty,
        }))
    }
}
