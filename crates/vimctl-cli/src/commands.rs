use anyhow::{bail, Context, Result};
use vimctl_remote::{resolve_executable, InstanceHandle, RemoteEditor};

use crate::cli_args::{Cli, CliCommand};

pub(crate) async fn execute_command(cli: &Cli) -> Result<()> {
    let config = cli.remote_editor_config();
    if matches!(cli.command, CliCommand::Doctor) {
        println!("{}", render_doctor_report(&config.executable)?);
        return Ok(());
    }

    let editor = RemoteEditor::new(config).context("invalid editor configuration")?;
    match &cli.command {
        CliCommand::Create {
            identifier,
            path,
            json,
        } => {
            let handle = editor
                .create_instance(identifier, path.as_deref())
                .await
                .with_context(|| format!("failed to create instance '{identifier}'"))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&handle)?);
            } else {
                println!("{}", render_instance_line(&handle));
            }
        }
        CliCommand::List { json } => {
            let mut handles = editor
                .list_instances()
                .await
                .context("failed to list running instances")?;
            handles.sort_by(|left, right| left.identifier().cmp(right.identifier()));
            if *json {
                println!("{}", serde_json::to_string_pretty(&handles)?);
            } else {
                for handle in &handles {
                    println!("{}", render_instance_line(handle));
                }
            }
        }
        CliCommand::Open {
            identifier,
            path,
            line,
        } => {
            editor
                .instance(identifier)?
                .open_at_line(path, *line)
                .await
                .with_context(|| format!("failed to open {} in '{identifier}'", path.display()))?;
        }
        CliCommand::Eval {
            identifier,
            expression,
        } => {
            let value = editor
                .instance(identifier)?
                .evaluate(expression)
                .await
                .with_context(|| format!("failed to evaluate expression in '{identifier}'"))?;
            println!("{value}");
        }
        CliCommand::Send { identifier, keys } => {
            editor
                .instance(identifier)?
                .send_keys(keys)
                .await
                .with_context(|| format!("failed to send keys to '{identifier}'"))?;
        }
        CliCommand::Exit { identifier, force } => {
            editor
                .instance(identifier)?
                .exit(*force)
                .await
                .with_context(|| format!("failed to exit '{identifier}'"))?;
        }
        CliCommand::Doctor => {}
    }
    Ok(())
}

fn render_instance_line(handle: &InstanceHandle) -> String {
    let location = handle
        .working_directory()
        .map(str::to_string)
        .or_else(|| handle.target_path().map(|path| path.display().to_string()))
        .unwrap_or_else(|| "-".to_string());
    format!("{}\t{location}", handle.identifier())
}

fn render_doctor_report(executable: &str) -> Result<String> {
    match resolve_executable(executable) {
        Some(path) => Ok(format!(
            "editor executable: {executable} -> {}",
            path.display()
        )),
        None => bail!("editor executable '{executable}' was not found or is not executable"),
    }
}
