use anyhow::{Context, Result};
use std::io::Write;
use tracing_subscriber::{EnvFilter, fmt};

#[cfg(windows)]
const DEFAULT_COMMAND: &str = "cmd.exe /c dir";
#[cfg(not(windows))]
const DEFAULT_COMMAND: &str = "ls -l";

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let mut stdout = std::io::stdout().lock();
    match command_capture::execute_bytes(DEFAULT_COMMAND) {
        Some(output) => {
            print_output(&mut stdout, &output).context("failed to write captured output")?
        }
        None => writeln!(stdout, "Failed to execute command.")?,
    }
    stdout.flush()?;
    Ok(())
}

fn print_output(out: &mut impl Write, output: &[u8]) -> std::io::Result<()> {
    out.write_all(b"Output:\n")?;
    out.write_all(output)?;
    out.write_all(b"\n")
}
