use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bf8_contracts::BF8C_PROFILE_SCHEMA_VERSION;
use bf8_vm::{filter_commands, render};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use bf8c::artifact::BuildReport;
use bf8c::compile::{self, BuildArtifact, BuildOptions, CompilerError};
use bf8c::compose;
use bf8c::diagnostics::{self, Diagnostic, Stage};
use bf8c::language;
use bf8c::module_source::FsModuleStore;
use bf8c::optimize;
use bf8c::profile;
use bf8c::project;
use bf8c::strings;

#[derive(Parser)]
#[command(name = "bf8c")]
#[command(about = "bf8 build pipeline (expand, lower, optimize, profile).", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    LangId,
    /// Print the input with every inclusion directive expanded.
    Expand {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        module_root: Vec<PathBuf>,
    },
    /// Print the input with string literals lowered to commands.
    Lower {
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the filtered, optimized command stream.
    Optimize {
        #[arg(long)]
        input: PathBuf,
    },
    /// Print loop depth and cell footprint as JSON.
    Profile {
        #[arg(long)]
        input: PathBuf,
    },
    /// Build an artifact from a project manifest or a single entry file.
    Build {
        #[arg(long, conflicts_with_all = ["input", "module_root"])]
        project: Option<PathBuf>,
        #[arg(long, required_unless_present = "project")]
        input: Option<PathBuf>,
        #[arg(long)]
        module_root: Vec<PathBuf>,
        #[arg(long)]
        version_tag: String,
        #[arg(long)]
        family: Option<String>,
        #[arg(long)]
        ext: Option<String>,
        /// Artifact directory (default: project out_dir, or `build`).
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        report_json: bool,
    },
}

#[derive(Debug, Serialize)]
struct BuildToolReport {
    ok: bool,
    artifact_path: String,
    #[serde(flatten)]
    build: BuildReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

const BUILD_REPORT_TEMPLATE: &str = "
{build}

Name: {name}
Size: {size} KB

Saved to {out_dir}.
";

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
        Cmd::LangId => {
            println!("{}", language::LANG_ID);
            Ok(std::process::ExitCode::SUCCESS)
        }
        Cmd::Expand { input, module_root } => {
            let src = read_input(&input)?;
            let store = FsModuleStore::new(module_root);
            match compose::expand(&src, &store) {
                Ok(expansion) => {
                    print!("{}", expansion.text);
                    Ok(std::process::ExitCode::SUCCESS)
                }
                Err(err) => {
                    emit_failure(false, (&err).into())?;
                    Ok(std::process::ExitCode::from(1))
                }
            }
        }
        Cmd::Lower { input } => {
            let src = read_input(&input)?;
            print!("{}", strings::lower(&src));
            Ok(std::process::ExitCode::SUCCESS)
        }
        Cmd::Optimize { input } => {
            let src = read_input(&input)?;
            let commands = optimize::optimize(&filter_commands(&src));
            println!("{}", render(&commands));
            Ok(std::process::ExitCode::SUCCESS)
        }
        Cmd::Profile { input } => {
            let src = read_input(&input)?;
            let commands = filter_commands(&src);
            let p = profile::profile(&commands);
            let json = serde_json::json!({
                "schema_version": BF8C_PROFILE_SCHEMA_VERSION,
                "size_bytes": commands.len(),
                "depth": p.depth,
                "cell_footprint": p.cell_footprint,
                "halt": p.halt,
                "truncated": p.truncated,
            });
            print_json(&json)?;
            Ok(std::process::ExitCode::SUCCESS)
        }
        Cmd::Build {
            project,
            input,
            module_root,
            version_tag,
            family,
            ext,
            out_dir,
            report_json,
        } => {
            let built = match (project, input) {
                (Some(project_path), _) => project::load_project_manifest(&project_path)
                    .map(|m| m.resolve(&project_path))
                    .and_then(|mut p| {
                        if let Some(family) = family {
                            p.family = family;
                        }
                        if let Some(ext) = ext {
                            p.ext = ext;
                        }
                        let artifact = p.build(&version_tag)?;
                        Ok((artifact, out_dir.unwrap_or(p.out_dir)))
                    }),
                (None, Some(input)) => read_input(&input).and_then(|src| {
                    let mut options = BuildOptions::new(version_tag);
                    if let Some(family) = family {
                        options.family = family;
                    }
                    if let Some(ext) = ext {
                        options.ext = ext;
                    }
                    let store = FsModuleStore::new(module_root);
                    tracing::debug!(roots = ?store.roots(), "module roots");
                    let artifact = compile::build(&src, &options, &store)?;
                    Ok((artifact, out_dir.unwrap_or_else(|| PathBuf::from("build"))))
                }),
                (None, None) => anyhow::bail!("set one of --project or --input"),
            };

            let (artifact, out_dir) = match built {
                Ok(ok) => ok,
                Err(err) => {
                    return match err.downcast_ref::<CompilerError>() {
                        Some(compile_err) => {
                            emit_failure(report_json, compile_err.into())?;
                            Ok(std::process::ExitCode::from(1))
                        }
                        None => {
                            emit_failure(report_json, diagnostics::load_failure(&err))?;
                            Ok(std::process::ExitCode::from(2))
                        }
                    };
                }
            };

            let path = match write_artifact(&out_dir, &artifact) {
                Ok(path) => path,
                Err(err) => {
                    let d = Diagnostic::error("BF8-IO-WRITE", Stage::Io, format!("{err:#}"));
                    emit_failure(report_json, d)?;
                    return Ok(std::process::ExitCode::from(2));
                }
            };

            let report = artifact.report();
            let mut warnings = Vec::new();
            if report.profile_truncated {
                warnings.push(Diagnostic::warning(
                    "BF8-PROFILE-TRUNCATED",
                    Stage::Profile,
                    "profiling step budget exhausted; cell footprint is a lower bound (see BF8_MAX_PROFILE_STEPS)",
                ));
            }

            if report_json {
                print_json(&BuildToolReport {
                    ok: true,
                    artifact_path: path.display().to_string(),
                    build: report,
                    diagnostics: warnings,
                })?;
            } else {
                for d in &warnings {
                    eprintln!("warning [{}]: {}", d.code, d.message);
                }
                print!(
                    "{}",
                    BUILD_REPORT_TEMPLATE
                        .replace("{build}", &artifact.text())
                        .replace("{name}", &report.name)
                        .replace("{size}", &format!("{:.3}", report.size_kb))
                        .replace("{out_dir}", &out_dir.display().to_string())
                );
            }
            Ok(std::process::ExitCode::SUCCESS)
        }
    }
}

fn emit_failure(report_json: bool, diagnostic: Diagnostic) -> Result<()> {
    if report_json {
        print_json(&diagnostics::Report::ok().with_diagnostics(vec![diagnostic]))
    } else {
        eprintln!("error [{}]: {}", diagnostic.code, diagnostic.message);
        for note in &diagnostic.notes {
            eprintln!("  note: {note}");
        }
        Ok(())
    }
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read input: {}", path.display()))
}

fn write_artifact(out_dir: &Path, artifact: &BuildArtifact) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))?;
    let path = out_dir.join(&artifact.name);
    std::fs::write(&path, artifact.text().as_bytes())
        .with_context(|| format!("write: {}", path.display()))?;
    Ok(path)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
