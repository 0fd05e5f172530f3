//! attrel REPL: evaluate attribute expressions interactively.
//!
//! Each input line is a template evaluated against the session's
//! attributes. Lines starting with `/` are meta-commands:
//! `/set`, `/unset`, `/attrs`, `/load`, `/ast`, `/tz`, `/functions`,
//! `/help`, `/quit`.

pub mod format;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use attrel_kernel::ast::sexpr::format_template;
use attrel_kernel::types::Zone;
use attrel_kernel::{Context, Engine, EngineConfig};

/// Result from meta-command handling.
#[derive(Debug)]
enum MetaResult {
    /// Continue with optional output
    Continue(Option<String>),
    /// Exit the REPL (caller should save history and exit)
    Exit,
}

/// REPL state: an engine plus the attributes expressions read.
pub struct Repl {
    engine: Engine,
    attributes: BTreeMap<String, String>,
    show_ast: bool,
    exit_requested: bool,
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

impl Repl {
    /// A REPL configured from the environment (`ATTREL_TZ`, `ATTREL_MAX_DEPTH`).
    pub fn new() -> Self {
        Self::with_config(EngineConfig::from_env())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            engine: Engine::new(config),
            attributes: BTreeMap::new(),
            show_ast: false,
            exit_requested: false,
        }
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Merge attributes from a JSON object file. Non-string values are
    /// stored as their JSON text.
    pub fn load_attributes(&mut self, path: &Path) -> Result<usize> {
        let loaded = format::read_attributes_json(path)?;
        let count = loaded.len();
        self.attributes.extend(loaded);
        Ok(count)
    }

    pub fn zone(&self) -> Zone {
        self.engine.config().default_zone
    }

    /// True once `/quit` (or `quit`/`exit`) has been entered.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Evaluate `text` against the current attributes.
    pub fn evaluate(&self, text: &str) -> Result<String, attrel_kernel::ExpressionError> {
        self.engine.evaluate(text, &Context::new(&self.attributes))
    }

    /// Process a single line of input.
    ///
    /// Returns `Ok(None)` for empty input and `Ok(Some(output))` for output
    /// to display. Template errors are output, not `Err`; `Err` is reserved
    /// for failing meta-commands such as an unreadable `/load` file.
    pub fn process_line(&mut self, line: &str) -> Result<Option<String>> {
        let trimmed = line.trim();

        if trimmed.starts_with('/') {
            return match self.handle_meta_command(trimmed)? {
                MetaResult::Continue(output) => Ok(output),
                MetaResult::Exit => {
                    self.exit_requested = true;
                    Ok(None)
                }
            };
        }

        if let Some(meta_result) = self.try_shell_style_command(trimmed)? {
            return match meta_result {
                MetaResult::Continue(output) => Ok(output),
                MetaResult::Exit => {
                    self.exit_requested = true;
                    Ok(None)
                }
            };
        }

        if trimmed.is_empty() {
            return Ok(None);
        }

        // leading and trailing spaces are part of the template
        let text = line.trim_end_matches(['\r', '\n']);

        if self.show_ast {
            return Ok(Some(match attrel_kernel::compile(text, self.engine.config()) {
                Ok(template) => format_template(&template),
                Err(error) => format::format_error(text, &error),
            }));
        }

        Ok(Some(match self.evaluate(text) {
            Ok(rendered) => format::format_output(&rendered, format::detect_context()),
            Err(error) => format::format_error(text, &error),
        }))
    }

    /// Handle a meta-command (starts with /).
    fn handle_meta_command(&mut self, cmd: &str) -> Result<MetaResult> {
        let (command, rest) = cmd
            .split_once(char::is_whitespace)
            .map_or((cmd, ""), |(c, r)| (c, r.trim()));

        let output = match command {
            "/quit" | "/q" | "/exit" => return Ok(MetaResult::Exit),
            "/help" | "/h" | "/?" => HELP_TEXT.to_string(),
            "/set" => match rest.split_once('=') {
                Some((name, value)) if !name.trim().is_empty() => {
                    let name = name.trim();
                    self.set_attribute(name, value);
                    format!("{name} = {value:?}")
                }
                _ => "usage: /set name=value".to_string(),
            },
            "/unset" => {
                if rest.is_empty() {
                    "usage: /unset name".to_string()
                } else if self.attributes.remove(rest).is_some() {
                    format!("unset {rest}")
                } else {
                    format!("{rest} is not set")
                }
            }
            "/attrs" | "/vars" => {
                if self.attributes.is_empty() {
                    "(no attributes set)".to_string()
                } else {
                    format::format_attributes(&self.attributes)?
                }
            }
            "/load" => {
                if rest.is_empty() {
                    bail!("usage: /load <file.json>");
                }
                let count = self.load_attributes(Path::new(rest))?;
                format!("loaded {count} attribute(s) from {rest}")
            }
            "/ast" => {
                self.show_ast = !self.show_ast;
                format!("AST mode: {}", if self.show_ast { "ON" } else { "OFF" })
            }
            "/tz" => {
                if rest.is_empty() {
                    format!("time zone: {}", self.zone())
                } else {
                    let zone = Zone::parse(rest)
                        .with_context(|| format!("unknown time zone: {rest}"))?;
                    self.engine = Engine::new(self.engine.config().with_default_zone(zone));
                    format!("time zone: {zone}")
                }
            }
            "/functions" | "/fns" => {
                let filter = Some(rest).filter(|r| !r.is_empty());
                format::format_functions(attrel_kernel::functions::registry(), filter)
            }
            _ => format!("Unknown command: {command}\nType /help for available commands."),
        };
        Ok(MetaResult::Continue(Some(output)))
    }

    /// Try to handle a shell-style command (without leading /).
    fn try_shell_style_command(&mut self, cmd: &str) -> Result<Option<MetaResult>> {
        match cmd {
            "quit" | "exit" => self.handle_meta_command("/quit").map(Some),
            "help" => self.handle_meta_command("/help").map(Some),
            _ => Ok(None),
        }
    }
}

const HELP_TEXT: &str = r#"attrel REPL

Every line is a template: text with ${...} expressions, evaluated
against the attributes set below. $$ is a literal dollar sign.

Meta Commands:
  /set name=value     Set an attribute (value is taken verbatim)
  /unset name         Remove an attribute
  /attrs              Show all attributes as JSON
  /load <file.json>   Merge attributes from a JSON object
  /ast                Toggle AST display mode
  /tz [zone]          Show or set the default time zone
  /functions [name]   List functions, optionally filtered by name
  /help, help         Show this help
  /quit, quit         Exit the REPL

Expressions:
  ${name}                          Attribute value ("" when missing)
  ${'odd name'}                    Quoted attribute name
  ${a:toBigDecimal():plus(1.5)}    Chain calls left to right
  ${literal('3.14'):toBigDecimal()}  Start a chain from a constant
  ${a:divide(${b}, 2, 'HALF_UP')}  Nest blocks as arguments

Examples:
  /set pi=3.14159
  ${pi:toBigDecimal():setScale(2, 'HALF_UP')}
  ${ts:toDate('yyyy-MM-dd', 'Asia/Shanghai'):getDayOfWeek()}
"#;

/// Default history file location.
fn history_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.data_dir().join("attrel").join("history.txt"))
}

/// Save REPL history to disk.
fn save_history(rl: &mut Editor<(), DefaultHistory>, history_path: &Option<PathBuf>) {
    if let Some(path) = history_path {
        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::warn!("Failed to create history directory: {}", e);
        }
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("Failed to save history: {}", e);
        }
    }
}

/// Run the interactive REPL until `/quit` or end of input.
pub fn run(mut repl: Repl) -> Result<()> {
    println!("attrel v{}", env!("CARGO_PKG_VERSION"));
    println!("Type /help for commands, /quit to exit.");

    let mut rl: Editor<(), DefaultHistory> =
        Editor::new().context("Failed to create editor")?;

    let history_path = history_path();
    if let Some(ref path) = history_path
        && let Err(e) = rl.load_history(path)
    {
        // a missing file is expected on first run
        let is_not_found = matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound);
        if !is_not_found {
            tracing::warn!("Failed to load history: {}", e);
        }
    }
    println!();

    loop {
        match rl.readline("attrel> ") {
            Ok(line) => {
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    tracing::warn!("Failed to add history entry: {}", e);
                }

                match repl.process_line(&line) {
                    Ok(Some(output)) => println!("{output}"),
                    Ok(None) => {}
                    Err(e) => eprintln!("Error: {e:#}"),
                }
                if repl.exit_requested() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    save_history(&mut rl, &history_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl() -> Repl {
        Repl::with_config(EngineConfig::default().with_default_zone(Zone::utc()))
    }

    #[test]
    fn set_then_evaluate() {
        let mut repl = repl();
        repl.process_line("/set n=41").expect("set");
        assert_eq!(
            repl.process_line("${n:plus(1)}").expect("eval"),
            Some("42".to_string())
        );
    }

    #[test]
    fn set_keeps_value_verbatim() {
        let mut repl = repl();
        repl.process_line("/set greeting= a=b ").expect("set");
        assert_eq!(repl.attributes()["greeting"], " a=b");
    }

    #[test]
    fn quit_sets_flag() {
        let mut repl = repl();
        assert!(!repl.exit_requested());
        assert_eq!(repl.process_line("quit").expect("quit"), None);
        assert!(repl.exit_requested());
    }

    #[test]
    fn bad_zone_is_an_error() {
        let mut repl = repl();
        assert!(repl.process_line("/tz Nowhere/Special").is_err());
        assert_eq!(repl.zone(), Zone::utc());
    }
}
