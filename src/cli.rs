use crate::store::Direction;
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: panel-menu [--data-dir DIR] <command>

Commands:
  show                              print the menu
  search <query>                    list matching applications
  launch <app-id>                   launch an application and record it
  add <category> [icon]             add a category
  rename <category> <new-name>      rename a category
  remove <category>                 remove a category
  move <category> up|down           reorder a category
  assign <category> <app-id> [name] add an application to a category
  unassign <category> <app-id>      remove an application from a category
  watch                             print the menu again on every change";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseArgsResult<T> {
    Parsed(T),
    Usage(String),
}

pub fn parse_args<T>(
    args: &[&str],
    usage: &str,
    parser: impl FnOnce(&[&str]) -> Option<T>,
) -> ParseArgsResult<T> {
    if args.is_empty() {
        return ParseArgsResult::Usage(usage.to_string());
    }
    match parser(args) {
        Some(parsed) => ParseArgsResult::Parsed(parsed),
        None => ParseArgsResult::Usage(usage.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Search(String),
    Launch(String),
    Add { name: String, icon: Option<PathBuf> },
    Rename { from: String, to: String },
    Remove(String),
    Move { name: String, direction: Direction },
    Assign { category: String, app_id: String, name: Option<String> },
    Unassign { category: String, app_id: String },
    Watch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub data_dir: Option<PathBuf>,
    pub command: Command,
}

/// Parse everything after the program name.
pub fn parse(args: &[&str]) -> ParseArgsResult<Invocation> {
    let (data_dir, rest) = match args {
        ["--data-dir", dir, rest @ ..] => (Some(PathBuf::from(*dir)), rest),
        _ => (None, args),
    };
    parse_args(rest, USAGE, parse_command).map_parsed(|command| Invocation { data_dir, command })
}

impl<T> ParseArgsResult<T> {
    fn map_parsed<U>(self, f: impl FnOnce(T) -> U) -> ParseArgsResult<U> {
        match self {
            ParseArgsResult::Parsed(v) => ParseArgsResult::Parsed(f(v)),
            ParseArgsResult::Usage(u) => ParseArgsResult::Usage(u),
        }
    }
}

fn parse_command(args: &[&str]) -> Option<Command> {
    let cmd = match args {
        ["show"] => Command::Show,
        ["watch"] => Command::Watch,
        ["search", query @ ..] if !query.is_empty() => Command::Search(query.join(" ")),
        ["launch", id] => Command::Launch(id.to_string()),
        ["add", name] => Command::Add {
            name: name.to_string(),
            icon: None,
        },
        ["add", name, icon] => Command::Add {
            name: name.to_string(),
            icon: Some(PathBuf::from(*icon)),
        },
        ["rename", from, to] => Command::Rename {
            from: from.to_string(),
            to: to.to_string(),
        },
        ["remove", name] => Command::Remove(name.to_string()),
        ["move", name, dir] => Command::Move {
            name: name.to_string(),
            direction: match *dir {
                "up" => Direction::Up,
                "down" => Direction::Down,
                _ => return None,
            },
        },
        ["assign", category, app_id, name @ ..] => Command::Assign {
            category: category.to_string(),
            app_id: app_id.to_string(),
            name: (!name.is_empty()).then(|| name.join(" ")),
        },
        ["unassign", category, app_id] => Command::Unassign {
            category: category.to_string(),
            app_id: app_id.to_string(),
        },
        _ => return None,
    };
    Some(cmd)
}
