//! Line commands for driving a viewer from a terminal.

use std::path::PathBuf;

use crate::input::{ClickTarget, InputEvent, Key, KeyEvent};

pub const HELP: &str = "\
commands:
  next | prev | home | end        navigate
  goto N | click N                activate thumbnail N
  wheel DX DY                     wheel over the thumbnail strip
  swipe DX                        horizontal touch swipe on the stage
  esc | tab | shift-tab           modal keys
  search TEXT | tag TAG           filter (inline viewer)
  add [PATH]                      press add, or add a local image file
  remove ID                       press remove on a thumbnail
  loaded                          the stage asset finished loading
  open [N] | close                show or hide the lightbox
  refresh | show | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Input(Vec<InputEvent>),
    Search(String),
    Tag(String),
    Add(Option<PathBuf>),
    Remove(String),
    Loaded,
    Open(isize),
    Close,
    Refresh,
    Show,
    Help,
    Quit,
}

fn key(key: Key) -> ConsoleCommand {
    ConsoleCommand::Input(vec![InputEvent::Key(KeyEvent::new(key))])
}

fn number<T: std::str::FromStr>(arg: Option<&str>, what: &str) -> Result<T, String> {
    let arg = arg.ok_or_else(|| format!("{what} is missing"))?;
    arg.parse()
        .map_err(|_| format!("{what} must be a number, got {arg:?}"))
}

/// Parses one console line. Blank lines parse to `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let mut args = rest.split_whitespace();
    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(None),
        "next" => key(Key::ArrowRight),
        "prev" => key(Key::ArrowLeft),
        "home" => key(Key::Home),
        "end" => key(Key::End),
        "esc" | "escape" => key(Key::Escape),
        "tab" => key(Key::Tab),
        "shift-tab" => ConsoleCommand::Input(vec![InputEvent::Key(KeyEvent::shifted(Key::Tab))]),
        "goto" | "click" => {
            let index = args.next().ok_or("thumbnail index is missing")?;
            ConsoleCommand::Input(vec![InputEvent::Click(ClickTarget::Thumb {
                index: index.to_string(),
            })])
        }
        "wheel" => {
            let dx = number(args.next(), "DX")?;
            let dy = number(args.next(), "DY")?;
            ConsoleCommand::Input(vec![InputEvent::Wheel { dx, dy }])
        }
        "swipe" => {
            let dx: f64 = number(args.next(), "DX")?;
            ConsoleCommand::Input(vec![
                InputEvent::TouchStart { x: 0.0 },
                InputEvent::TouchEnd { x: dx },
            ])
        }
        "search" => ConsoleCommand::Search(rest.to_string()),
        "tag" => ConsoleCommand::Tag(if rest.is_empty() { "all" } else { rest }.to_string()),
        "add" => ConsoleCommand::Add((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "remove" => {
            let id = args.next().ok_or("item id is missing")?;
            ConsoleCommand::Remove(id.to_string())
        }
        "loaded" => ConsoleCommand::Loaded,
        "open" => ConsoleCommand::Open(match args.next() {
            Some(arg) => number(Some(arg), "start index")?,
            None => 0,
        }),
        "close" => ConsoleCommand::Close,
        "refresh" => ConsoleCommand::Refresh,
        "show" => ConsoleCommand::Show,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command {other:?}; try `help`")),
    };
    Ok(Some(command))
}
