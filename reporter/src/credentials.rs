//! Credential sources on the command line.
//!
//! The first positional argument is either a credentials file (username on
//! the first line, password on the second) or a username followed by a
//! password. Everything after that is the command.

use std::path::{Path, PathBuf};

use degiro_broker::Credentials;
use log::info;

use crate::error::{Error, Result};

pub const USAGE: &str = "usage: degiro [OPTIONS] <CREDENTIALS_FILE | USERNAME PASSWORD> <COMMAND> [ARGS]...";

/// Where the credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    File(PathBuf),
    Inline { username: String, password: String },
}

/// Split positional arguments into the credential source and the command.
pub fn split_args(args: &[String]) -> Result<(CredentialSource, &[String])> {
    let (source, rest) = match args {
        [first, rest @ ..] if Path::new(first).is_file() => {
            (CredentialSource::File(PathBuf::from(first)), rest)
        }
        [username, password, rest @ ..] => (
            CredentialSource::Inline {
                username: username.clone(),
                password: password.clone(),
            },
            rest,
        ),
        _ => return Err(Error::Usage(USAGE.into())),
    };
    if rest.is_empty() {
        return Err(Error::Usage(USAGE.into()));
    }
    Ok((source, rest))
}

/// Parse a credentials file: username line, then an optional password line.
pub fn parse_file(contents: &str) -> Result<(String, Option<String>)> {
    let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());
    let username = lines
        .next()
        .ok_or_else(|| Error::Credentials("credentials file is empty".into()))?;
    Ok((username.to_string(), lines.next().map(str::to_string)))
}

/// Resolve credentials, asking `prompt` for a password the file lacks.
pub fn resolve<P>(source: CredentialSource, prompt: P) -> Result<Credentials>
where
    P: FnOnce(&str) -> Result<String>,
{
    match source {
        CredentialSource::Inline { username, password } => Ok(Credentials::new(username, password)),
        CredentialSource::File(path) => {
            info!("Reading credentials at {}", path.display());
            let contents = std::fs::read_to_string(&path).map_err(|source| {
                Error::CredentialsRead {
                    path: path.clone(),
                    source,
                }
            })?;
            let (username, password) = parse_file(&contents)?;
            let password = match password {
                Some(p) => p,
                None => prompt(&username)?,
            };
            Ok(Credentials::new(username, password))
        }
    }
}

/// Interactive password prompt on the terminal.
pub fn prompt_password(username: &str) -> Result<String> {
    dialoguer::Password::new()
        .with_prompt(format!("Password for {username}"))
        .interact()
        .map_err(|e| Error::Credentials(e.to_string()))
}
