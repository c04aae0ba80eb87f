use std::path::PathBuf;

use anyhow::Context;

use crate::console::LinePrompt;
use crate::error::PreconditionError;
use crate::sync::{PhotoPayload, ViewSynchronizer};

pub const SHELL_HELP: &str = "\
Commands:
  open <SKU>           open (or create) the folder for a SKU
  list                 refresh the folder list
  select <N>           open folder number N from the last list
  capture <FILE>...    upload files as the next photos of the open folder
  delete <PHOTO-ID>    delete a photo from the open folder
  rename [NAME]        rename the open folder
  rmdir                delete the open folder and its photos
  back                 close the open folder
  login                start a new session
  logout               clear the session
  help                 show this help
  quit                 leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Open(String),
    List,
    Select(usize),
    Capture(Vec<PathBuf>),
    Delete(String),
    Rename(Option<String>),
    RemoveFolder,
    Back,
    Login,
    Logout,
    Help,
    Quit,
    Empty,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let command = match verb {
            "" => ShellCommand::Empty,
            "open" | "cd" if !rest.is_empty() => ShellCommand::Open(rest.to_string()),
            "open" | "cd" => return Err("usage: open <SKU>".to_string()),
            "list" | "ls" => ShellCommand::List,
            "select" => match rest.parse::<usize>() {
                Ok(index) if index > 0 => ShellCommand::Select(index),
                _ => return Err("usage: select <N>".to_string()),
            },
            "capture" | "upload" => {
                let files: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                if files.is_empty() {
                    return Err("usage: capture <FILE>...".to_string());
                }
                ShellCommand::Capture(files)
            }
            "delete" | "rm" if !rest.is_empty() => ShellCommand::Delete(rest.to_string()),
            "delete" | "rm" => return Err("usage: delete <PHOTO-ID>".to_string()),
            "rename" => ShellCommand::Rename((!rest.is_empty()).then(|| rest.to_string())),
            "rmdir" => ShellCommand::RemoveFolder,
            "back" => ShellCommand::Back,
            "login" => ShellCommand::Login,
            "logout" => ShellCommand::Logout,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => return Err(format!("unknown command: {other} (try `help`)")),
        };
        Ok(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub async fn load_payloads(files: &[PathBuf]) -> anyhow::Result<Vec<PhotoPayload>> {
    let mut payloads = Vec::with_capacity(files.len());
    for file in files {
        let payload = PhotoPayload::from_path(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?;
        payloads.push(payload);
    }
    Ok(payloads)
}

pub async fn execute(sync: &mut ViewSynchronizer, command: ShellCommand) -> anyhow::Result<Flow> {
    match command {
        ShellCommand::Empty => {}
        ShellCommand::Open(name) => {
            if sync.open_folder(&name).await?.is_none() {
                println!("Folder for SKU \"{}\" was not created.", name.trim());
            }
        }
        ShellCommand::List => {
            sync.refresh_folder_list().await?;
        }
        ShellCommand::Select(index) => {
            let folder = sync
                .folder_list()
                .and_then(|list| list.folders.get(index - 1))
                .map(|summary| summary.folder.clone())
                .with_context(|| format!("no folder number {index} in the last list"))?;
            sync.select_folder(folder).await?;
        }
        ShellCommand::Capture(files) => {
            let payloads = load_payloads(&files).await?;
            for name in sync.upload_batch(payloads).await? {
                println!("uploaded {name}");
            }
        }
        ShellCommand::Delete(id) => sync.delete_photo(&id).await?,
        ShellCommand::Rename(name) => {
            let renamed = match name {
                Some(name) => {
                    let folder = sync
                        .session()
                        .and_then(|s| s.current_folder().cloned())
                        .ok_or(PreconditionError::NoActiveFolder)?;
                    sync.rename_folder(&folder, &name).await?
                }
                None => sync.rename_current_folder().await?,
            };
            match renamed {
                Some(folder) => println!("folder renamed to {}", folder.name),
                None => println!("folder name unchanged"),
            }
        }
        ShellCommand::RemoveFolder => {
            if !sync.delete_current_folder().await? {
                println!("folder kept");
            }
        }
        ShellCommand::Back => sync.back().await?,
        ShellCommand::Login => sync.start().await?,
        ShellCommand::Logout => {
            sync.logout();
            println!("signed out; use `login` to start again");
        }
        ShellCommand::Help => println!("{SHELL_HELP}"),
        ShellCommand::Quit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

/// Reads commands until `quit` or end of input. Command failures are
/// reported and the loop continues; the session state is left as it was.
pub async fn run(sync: &mut ViewSynchronizer, prompt: &LinePrompt) -> anyhow::Result<()> {
    println!("{SHELL_HELP}");
    loop {
        let folder = sync
            .session()
            .and_then(|s| s.current_folder_name())
            .unwrap_or("-")
            .to_string();
        prompt.write_prompt(&format!("skuphotos [{folder}]> "));
        let Some(line) = prompt.read_line() else {
            break;
        };
        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        match execute(sync, command).await {
            Ok(Flow::Exit) => break,
            Ok(Flow::Continue) => {}
            Err(err) => {
                tracing::warn!(error = %err, "command failed");
                eprintln!("error: {err:#}");
            }
        }
    }
    Ok(())
}
