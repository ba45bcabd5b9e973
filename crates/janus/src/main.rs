use clap::Parser;
use janus::shell::{Outcome, Shell};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// An interactive checker and evaluator for a dependently-typed λ-calculus
/// with quantitative (0/1/ω) usage annotations.
#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Source files to run before the interactive session starts.
    files: Vec<PathBuf>,

    /// Run the files and exit instead of starting a session.
    #[arg(long)]
    batch: bool,
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut shell = Shell::new();

    for file in &args.files {
        if !shell.load_path(file, &mut io::stdout())? {
            return Ok(ExitCode::FAILURE);
        }
    }
    if args.batch {
        return Ok(ExitCode::SUCCESS);
    }

    repl(&mut shell)?;
    Ok(ExitCode::SUCCESS)
}

fn repl(shell: &mut Shell) -> io::Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        let mut out = io::stdout();
        write!(out, "Janus> ")?;
        out.flush()?;
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            // End of input: leave as cleanly as :quit.
            writeln!(out)?;
            return Ok(());
        }
        match shell.submit(&line, &mut out)? {
            Outcome::Continue => {}
            Outcome::Quit => return Ok(()),
        }
    }
}
