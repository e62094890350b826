use clap::Parser;
use std::path::PathBuf;

/// Translate an annotated WLP4 parse tree into assembly for the target ISA.
#[derive(Parser)]
pub struct Args {
    /// Parse-tree file to read; standard input when omitted.
    pub input: Option<PathBuf>,
}
