use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use rvlayout::assembler::{self, Assembly, LayoutOptions, NoOpCallback};
use rvlayout::config::Config;
use rvlayout::dump::{self, ProgressCallback};
use rvlayout::error::LayoutError;
use rvlayout::samples::Sample;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let config = Config::parse();

    let default_level = if config.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    match drive(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn drive(config: &Config) -> Result<()> {
    let sample = config.sample.build();
    let options = LayoutOptions { max_passes: config.max_passes };
    let origin = config.origin as i64;

    let assembly = if config.verbose {
        let progress = ProgressCallback;
        progress.print_header();
        assembler::assemble_with(&sample.program, sample.root, origin, &options, &progress)?
    } else {
        assembler::assemble_with(&sample.program, sample.root, origin, &options, &NoOpCallback)?
    };

    if config.verbose {
        eprintln!(
            "  Converged after {} pass{}",
            assembly.passes,
            if assembly.passes == 1 { "" } else { "es" }
        );
        eprintln!("  Entry:  0x{:x}", assembly.address_of(sample.entry));
        eprintln!(
            "  Image:  0x{:x}..0x{:x} ({} bytes)",
            assembly.origin,
            assembly.end(),
            assembly.bytes.len()
        );
    }

    if config.dump_code {
        let labels = dump::labels(&sample.program, |id| assembly.address_of(id));
        print!("{}", dump::dump_code(&assembly.bytes, assembly.origin, &labels));
        println!("\n(No output file generated)");
        return Ok(());
    }

    write_output(config, &sample, &assembly)
}

fn write_output(config: &Config, sample: &Sample, assembly: &Assembly) -> Result<()> {
    tracing::debug!(
        path = %config.output.display(),
        entry = assembly.address_of(sample.entry),
        "writing image"
    );
    std::fs::write(&config.output, &assembly.bytes)
        .with_context(|| format!("could not write '{}'", config.output.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&config.output, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("could not set permissions on '{}'", config.output.display()))?;
    }

    Ok(())
}

fn report(e: &anyhow::Error) {
    let prefix = if io::stderr().is_tty() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    };
    match e.downcast_ref::<LayoutError>() {
        Some(LayoutError::Fields(diagnostics)) => {
            for diagnostic in diagnostics {
                eprintln!("{} {}", prefix, diagnostic);
            }
        }
        Some(LayoutError::NotConverged { diagnostics, .. }) => {
            eprintln!("{} {}", prefix, e);
            for diagnostic in diagnostics {
                eprintln!("{} {}", prefix, diagnostic);
            }
        }
        _ => eprintln!("{} {:#}", prefix, e),
    }
}
