//! Terminal implementation of the replication operator

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use colored::*;
use dialoguer::Input;
use is_terminal::IsTerminal;

use crate::replication::Operator;

/// Prints to stdout and reads confirmation from stdin
#[derive(Debug, Default)]
pub struct TerminalOperator;

impl TerminalOperator {
    pub fn new() -> Self {
        Self
    }
}

impl Operator for TerminalOperator {
    fn present(&mut self, text: &str) {
        for line in text.lines() {
            println!("{}", highlight(line));
        }
    }

    fn read_confirmation(&mut self, prompt: &str) -> Result<String> {
        if io::stdin().is_terminal() {
            return Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
                .context("Failed to read confirmation from terminal");
        }

        // Piped input: no line editing, just one line
        read_piped_confirmation(io::stdin().lock(), io::stdout(), prompt)
    }
}

/// Write the prompt, then read a single line; EOF yields an empty string
fn read_piped_confirmation<R, W>(mut input: R, mut output: W, prompt: &str) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{}: ", prompt).context("Failed to write prompt")?;
    output.flush().context("Failed to flush prompt")?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read confirmation from stdin")?;
    Ok(line)
}

/// Colour the action of a report line, leave everything else alone
fn highlight(line: &str) -> String {
    match line.rsplit_once(" => ") {
        Some((namespace, "Register")) => format!("{} => {}", namespace, "Register".green()),
        Some((namespace, "Unregister")) => format!("{} => {}", namespace, "Unregister".red()),
        _ => line.to_string(),
    }
}
