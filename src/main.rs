use std::{
    fs,
    io::{self, Write as _},
    process::ExitCode,
};

use clap::Parser as _;
use log::{debug, info, LevelFilter};

use error::Error;

mod args;
mod dump;
mod error;
mod extract;
mod hex_dump;
mod image;

#[cfg(test)]
mod test_elf;

fn main() -> ExitCode {
    let args = args::Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("Dump failed: {err:?}");
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(args: &args::Args) -> Result<(), Error> {
    info!("Reading {}", args.input.display());
    let input_bytes = fs::read(&args.input).map_err(|source| Error::ReadInput {
        path: args.input.clone(),
        source,
    })?;

    let stdout = io::stdout();
    let mut output = io::BufWriter::new(stdout.lock());

    let res = dump::run(&input_bytes, &args.dump_request(), &mut output);
    // Whatever was dumped before a failure is still shown.
    output.flush()?;
    res
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}
