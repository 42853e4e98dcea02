use clap::Parser;
use std::io::{ErrorKind, Write};
use std::process::ExitCode;

use inf::cli::{init_tracing, run, Args};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let output = match run(&args).await {
        Ok(output) => output,
        Err(e) => {
            eprintln!("inf: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match std::io::stdout().lock().write_all(output.as_bytes()) {
        Ok(()) => ExitCode::SUCCESS,
        // piping into `head` and similar is not an error
        Err(e) if e.kind() == ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("inf: failed to write output: {}", e);
            ExitCode::FAILURE
        }
    }
}
