use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use dlift::config::TransformConfig;
use dlift::diag::Diagnostic;
use dlift::error::RunError;
use dlift::pass::parse_pass_list;
use dlift::persist::{run_file, Destination, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "dlift",
    version,
    about = "dlift: lifts an interpreter's opcode switch into a dispatch table"
)]
struct Cli {
    /// C++ source file to transform
    source: PathBuf,

    /// Write the result here instead of overwriting SOURCE
    #[arg(short, long, conflicts_with_all = ["stdout", "check"])]
    output: Option<PathBuf>,

    /// Print the result to stdout and write nothing
    #[arg(long, conflicts_with = "check")]
    stdout: bool,

    /// Run the passes and report, but write nothing
    #[arg(long)]
    check: bool,

    /// Pass to run, in order (hook, lift, unwrap); repeatable
    #[arg(short, long = "pass", value_name = "NAME")]
    passes: Vec<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reject switch regions with braces inside literals or comments
    #[arg(long)]
    strict: bool,

    /// Write a JSON run report
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Print pass progress and diagnostic hints
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .without_time()
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err.to_diagnostic(), cli.verbose);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let mut config = match &cli.config {
        Some(path) => TransformConfig::load(path)?,
        None => TransformConfig::default(),
    };
    if !cli.passes.is_empty() {
        config.passes = parse_pass_list(&cli.passes)?;
    }
    config.strict_braces |= cli.strict;

    let destination = match &cli.output {
        Some(path) => Destination::File(path.clone()),
        None if cli.stdout || cli.check => Destination::Caller,
        None => Destination::InPlace,
    };
    let options = RunOptions {
        source: cli.source.clone(),
        destination,
        config,
        report: cli.report.clone(),
    };

    let output = run_file(&options, |_, diagnostics| {
        for diag in diagnostics {
            report(diag, cli.verbose);
        }
    })?;

    if cli.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(output.text.as_bytes())
            .map_err(|e| RunError::io("<stdout>", e))?;
    }
    if cli.verbose {
        if let Some((blocks, opcodes)) = output.lifted {
            eprintln!("dlift: lifted {blocks} case block(s) covering {opcodes} opcode(s)");
        }
        eprintln!("dlift: input  sha256 {}", output.provenance.input_hash_hex());
        eprintln!("dlift: output sha256 {}", output.provenance.output_hash_hex());
    }
    Ok(())
}

fn report(diag: &Diagnostic, verbose: bool) {
    eprintln!("dlift: {diag}");
    if verbose {
        if let Some(hint) = &diag.hint {
            eprintln!("  hint: {hint}");
        }
    }
}
