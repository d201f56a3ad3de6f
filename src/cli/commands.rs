use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, CodecService};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{demo_tree, describe_toml};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(format) = cli.format {
        settings.format = format;
    }
    debug!("settings: {:?}", settings);
    let service = CodecService::new(settings);

    match &cli.command {
        Some(Commands::Encode { description }) => _encode(&service, description),
        Some(Commands::Decode { buffer, toml }) => _decode(&service, buffer, *toml),
        Some(Commands::Check { buffers }) => _check(&service, buffers),
        Some(Commands::Demo) => _demo(&service),
        Some(Commands::Config { command }) => _config(&service, command),
        Some(Commands::Completion { shell }) => _completion(*shell),
        None => Err(CliError::Usage(
            "no command given, see `uiwire --help`".to_string(),
        )),
    }
}

/// Reads a file with `read`, or stdin for "-".
fn read_input(
    path: &Path,
    read: impl FnOnce(&Path) -> ApplicationResult<String>,
) -> CliResult<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| CliError::io("read stdin", e))?;
        return Ok(buffer);
    }
    Ok(read(path)?)
}

#[instrument(skip(service))]
fn _encode(service: &CodecService, description: &Path) -> CliResult<()> {
    let input = read_input(description, |path| service.read_description(path))?;
    let buffer = service.encode_description(&input)?;
    output::info(&buffer);
    Ok(())
}

#[instrument(skip(service))]
fn _decode(service: &CodecService, buffer: &Path, toml: bool) -> CliResult<()> {
    let input = read_input(buffer, |path| service.read_buffer(path))?;
    let tree = service.decode(&input)?;
    if toml {
        let description = describe_toml(&tree).map_err(ApplicationError::from)?;
        output::info(&description);
    } else {
        output::info(&tree);
    }
    Ok(())
}

#[instrument(skip(service))]
fn _check(service: &CodecService, buffers: &[PathBuf]) -> CliResult<()> {
    let results = service.verify_files(buffers);
    let mut failed = 0;
    for (path, result) in &results {
        match result {
            Ok(report) => output::success(&format!(
                "{}: {} nodes, depth {}, {} bytes",
                path.display(),
                report.nodes,
                report.depth,
                report.bytes
            )),
            Err(e) => {
                failed += 1;
                output::failure(&format!("{}: {}", path.display(), e));
            }
        }
    }
    if failed > 0 {
        return Err(CliError::CheckFailed {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}

#[instrument(skip(service))]
fn _demo(service: &CodecService) -> CliResult<()> {
    let tree = demo_tree();
    let buffer = service.encode(&tree);
    output::header(&format!("{} format", service.settings().format));
    output::info(&tree);
    output::info(&format!("Binary data length {}", buffer.len()));
    output::info(&buffer);
    let decoded = service.decode(&buffer)?;
    output::info(&decoded);
    Ok(())
}

fn _config(service: &CodecService, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&service.settings().to_toml()?),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::error("cannot determine config directory"),
        },
        ConfigCommands::Init => output::info(&Settings::template()),
    }
    Ok(())
}

fn _completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use tempfile::TempDir;

    #[test]
    fn given_missing_description_when_reading_input_then_error_names_description() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        let service = CodecService::new(Settings::default());

        let err = read_input(&path, |p| service.read_description(p)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("read description"), "{}", message);
        assert!(!message.contains("read buffer"), "{}", message);
    }
}
