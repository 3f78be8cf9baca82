//! Module `commands`
//!
//! Defines the typed FTP command set and the line parser that produces it.
//! A command is a fresh (verb, argument) value per input line; it is not
//! retained beyond the dispatch call that consumes it.

use crate::error::ParseError;

/// Represents an FTP command parsed from the client input.
///
/// Commands that require an argument carry it as a `String`; `LIST` and
/// `NLST` take an optional pathname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    User(String),
    Type(String),
    Cwd(String),
    Cdup,
    Pwd,
    List(Option<String>),
    Nlst(Option<String>),
    Retr(String),
    Stor(String),
    Dele(String),
    Rmd(String),
    Mkd(String),
    Quit,
    Epsv,
    Rnfr(String),
    Rnto(String),
}

/// Parses one raw control-connection line into a `Command`.
///
/// Verbs are case-insensitive; the argument is everything after the first
/// run of whitespace. A known verb missing its required argument and an
/// unknown verb are distinct parse errors, mapped to 501 and 500
/// respectively by the session runner.
pub fn parse_command(raw: &str) -> Result<Command, ParseError> {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    match verb.as_str() {
        "USER" => Ok(Command::User(required(arg, "USER")?)),
        "TYPE" => Ok(Command::Type(required(arg, "TYPE")?)),
        "CWD" => Ok(Command::Cwd(required(arg, "CWD")?)),
        "CDUP" => Ok(Command::Cdup),
        "PWD" => Ok(Command::Pwd),
        "LIST" => Ok(Command::List(arg.map(String::from))),
        "NLST" => Ok(Command::Nlst(arg.map(String::from))),
        "RETR" => Ok(Command::Retr(required(arg, "RETR")?)),
        "STOR" => Ok(Command::Stor(required(arg, "STOR")?)),
        "DELE" => Ok(Command::Dele(required(arg, "DELE")?)),
        "RMD" => Ok(Command::Rmd(required(arg, "RMD")?)),
        "MKD" => Ok(Command::Mkd(required(arg, "MKD")?)),
        "QUIT" => Ok(Command::Quit),
        "EPSV" => Ok(Command::Epsv),
        "RNFR" => Ok(Command::Rnfr(required(arg, "RNFR")?)),
        "RNTO" => Ok(Command::Rnto(required(arg, "RNTO")?)),
        _ => Err(ParseError::UnknownCommand(verb)),
    }
}

fn required(arg: Option<&str>, verb: &'static str) -> Result<String, ParseError> {
    arg.map(String::from).ok_or(ParseError::MissingArgument(verb))
}
