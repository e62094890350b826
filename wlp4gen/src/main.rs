use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader};
use std::process::ExitCode;
use wlp4gen::args::Args;

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wlp4gen: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), wlp4gen::Error> {
    let stdout = io::stdout().lock();
    match &args.input {
        Some(path) => wlp4gen::compile(BufReader::new(File::open(path)?), stdout),
        None => wlp4gen::compile(io::stdin().lock(), stdout),
    }
}
