use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::Engine;
use bf8_contracts::BF8_VM_REPORT_SCHEMA_VERSION;
use bf8_vm::{filter_commands, run_with_options, RunOptions};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bf8-vm")]
#[command(about = "bf8 interpreter.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run a program file against an input stream.
    Run {
        #[arg(long)]
        program: PathBuf,
        /// Input stream given inline.
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,
        /// Input stream read from a file.
        #[arg(long)]
        input_file: Option<PathBuf>,
        /// Halt with `step_limit` after this many instructions.
        #[arg(long)]
        max_steps: Option<u64>,
        #[arg(long)]
        report_json: bool,
    },
}

fn main() -> std::process::ExitCode {
    init_logging();
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::ExitCode::from(2)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn try_main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Run {
            program,
            input,
            input_file,
            max_steps,
            report_json,
        } => {
            let src = std::fs::read_to_string(&program)
                .with_context(|| format!("read program: {}", program.display()))?;
            let input: Vec<u8> = match (input, input_file) {
                (Some(s), _) => s.into_bytes(),
                (None, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("read input: {}", path.display()))?,
                (None, None) => Vec::new(),
            };

            let commands = filter_commands(&src);
            let result = run_with_options(&commands, &input, &RunOptions { max_steps });
            let exit_code: u8 = if result.status.is_ok() { 0 } else { 1 };

            if report_json {
                let b64 = base64::engine::general_purpose::STANDARD;
                let json = serde_json::json!({
                    "schema_version": BF8_VM_REPORT_SCHEMA_VERSION,
                    "ok": result.status.is_ok(),
                    "exit_code": exit_code,
                    "status": result.status,
                    "output_text": result.output_text(),
                    "output_b64": b64.encode(&result.output),
                    "tape": result.tape,
                    "head": result.head,
                    "step_count": result.step_count,
                    "scan_count": result.scan_count,
                    "max_depth": result.max_depth,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
                return Ok(std::process::ExitCode::from(exit_code));
            }

            use std::io::Write as _;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&result.output).context("write output")?;
            stdout.flush().context("flush output")?;
            if !result.status.is_ok() {
                eprintln!(
                    "halted: {} after {} steps",
                    result.status.as_str(),
                    result.step_count
                );
            }
            Ok(std::process::ExitCode::from(exit_code))
        }
    }
}
