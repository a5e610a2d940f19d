//! Line-oriented interactive session over one working directory.

use anyhow::Result;
use cbtopo_analyzer::{
    OutputFormat, RunOutput, SessionBindings, Settings, Toolkit, SESSION_SEPARATOR,
};
use cbtopo_common::Error;
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

const PROMPT: &str = "cbtopo> ";

const HELP: &str = "\
commands:
  run        summarize the log locations and bind node ids
  ids        list bound node and service ids
  show <id>  print the node bound to an id
  reset      forget all bindings
  quit       leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Ids,
    Show(String),
    Reset,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = words.next().unwrap_or("");
        let arg = words.next();
        match (command, arg) {
            ("run", None) => Ok(Command::Run),
            ("ids", None) => Ok(Command::Ids),
            ("show", Some(id)) => Ok(Command::Show(id.to_string())),
            ("reset", None) => Ok(Command::Reset),
            ("help", None) | ("?", None) => Ok(Command::Help),
            ("quit", None) | ("exit", None) => Ok(Command::Quit),
            _ => Err(Error::Other(format!("unknown command: {}", s.trim()))),
        }
    }
}

pub struct Session<'a> {
    dir: &'a Path,
    toolkit: &'a Toolkit,
    settings: &'a Settings,
    bindings: SessionBindings,
    last: Option<RunOutput>,
}

impl<'a> Session<'a> {
    pub fn new(dir: &'a Path, toolkit: &'a Toolkit, settings: &'a Settings) -> Self {
        Self {
            dir,
            toolkit,
            settings,
            bindings: SessionBindings::new(),
            last: None,
        }
    }

    /// Read commands until `quit` or end of input.
    pub fn run_loop<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                match line.parse::<Command>() {
                    Ok(Command::Quit) => return Ok(()),
                    Ok(command) => self.execute(command, &mut out)?,
                    Err(e) => writeln!(out, "{} (try `help`)", e)?,
                }
            }
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }

        writeln!(out)?;
        Ok(())
    }

    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Run => {
                match cbtopo_analyzer::run(
                    self.dir,
                    self.toolkit,
                    self.settings,
                    OutputFormat::Text,
                    Some(&mut self.bindings),
                ) {
                    Ok(output) => {
                        for table in &output.tables {
                            writeln!(out, "{}\n", table)?;
                        }
                        writeln!(out, "{}", SESSION_SEPARATOR)?;
                        writeln!(out, "{}", output.report)?;
                        self.last = Some(output);
                    }
                    Err(e) => {
                        warn!("Run failed: {}", e);
                        writeln!(out, "run failed: {}", e)?;
                    }
                }
            }
            Command::Ids => {
                writeln!(out, "nAll: {}", self.bindings.node_ids().join(" "))?;
                for service in self.bindings.services() {
                    writeln!(
                        out,
                        "{}All: {}",
                        service,
                        self.bindings.service_ids(service).join(" ")
                    )?;
                }
            }
            Command::Show(id) => match self.bindings.resolve(&id) {
                Some(node) => {
                    writeln!(out, "{} = {}", id, node)?;
                    let results = self
                        .last
                        .as_ref()
                        .and_then(|output| output.run.nodes.results.get(node));
                    if let Some(results) = results {
                        writeln!(out, "{}", serde_json::to_string_pretty(results)?)?;
                    }
                }
                None => writeln!(out, "unknown id: {}", id)?,
            },
            Command::Reset => {
                self.bindings.reset();
                writeln!(out, "bindings cleared")?;
            }
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => {}
        }
        Ok(())
    }
}
