// Terminal I/O seam for the interactive driver

use anyhow::{anyhow, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, BufRead, IsTerminal, Write};

/// Line-oriented user interaction. `Ok(None)` means input is closed.
pub trait Prompter {
    fn say(&mut self, text: &str) -> Result<()>;
    fn ask(&mut self, prompt: &str) -> Result<Option<String>>;
    /// Like `ask`, but the answer is not echoed.
    fn ask_secret(&mut self, prompt: &str) -> Result<Option<String>>;
}

#[derive(Debug, Default)]
pub struct StdioPrompter;

impl StdioPrompter {
    pub fn new() -> Self {
        Self
    }

    fn read_line() -> Result<Option<String>> {
        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Read keys in raw mode, echoing `*` per character.
    fn read_masked() -> Result<Option<String>> {
        enable_raw_mode()?;
        let result = Self::masked_loop();
        disable_raw_mode()?;
        println!();
        result
    }

    fn masked_loop() -> Result<Option<String>> {
        let mut value = String::new();
        let mut stdout = io::stdout();
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => return Ok(Some(value)),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(anyhow!("Input cancelled"));
                }
                KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(None);
                }
                KeyCode::Char(c) => {
                    value.push(c);
                    write!(stdout, "*")?;
                }
                KeyCode::Backspace => {
                    if value.pop().is_some() {
                        write!(stdout, "\u{8} \u{8}")?;
                    }
                }
                KeyCode::Esc => return Err(anyhow!("Input cancelled")),
                _ => {}
            }
            stdout.flush()?;
        }
    }
}

impl Prompter for StdioPrompter {
    fn say(&mut self, text: &str) -> Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        Self::read_line()
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        // Piped input has no terminal to switch into raw mode.
        if io::stdin().is_terminal() {
            Self::read_masked()
        } else {
            Self::read_line()
        }
    }
}
