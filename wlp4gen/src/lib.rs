use std::io::{self, BufRead, Write};
use thiserror::Error;

pub mod args;
pub mod codegen;
pub mod parse;

/// Read an annotated parse tree, translate it, and write the assembly
/// program. Nothing is written on error.
pub fn compile(input: impl BufRead, mut output: impl Write) -> Result<(), Error> {
    let registry = tree::Registry::wlp4();
    let root = parse::load(input, &registry)?;
    let program = codegen::generate(&root)?;
    output.write_all(&program)?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("loading parse tree: {0}")]
    Load(#[from] parse::Error),
    #[error("generating code: {0}")]
    Codegen(#[from] codegen::Error),
}
