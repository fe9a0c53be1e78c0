use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Operator interaction surface. The resolver only talks to this trait,
/// so tests can script the answers instead of driving a real terminal.
pub trait Prompter {
    /// Free-text prompt. Returns `None` when the operator enters nothing.
    fn prompt(&mut self, label: &str) -> Result<Option<String>>;

    /// Yes/no question; empty input means no.
    fn confirm(&mut self, label: &str) -> Result<bool>;

    /// Numbered menu. Option `0` is always "None of the Above"; the
    /// returned index is `0` for that, or `1..=choices.len()`.
    fn menu(&mut self, label: &str, choices: &[String]) -> Result<usize>;
}

/// Line-based stdin/stdout prompter used by the real CLI.
pub struct Console;

impl Console {
    fn read_line(&self) -> Result<String> {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read from stdin")?;
        Ok(line.trim().to_string())
    }
}

impl Prompter for Console {
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        print!("{label}: ");
        io::stdout().flush()?;
        let line = self.read_line()?;
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    fn confirm(&mut self, label: &str) -> Result<bool> {
        print!("{label} [y/N]: ");
        io::stdout().flush()?;
        let line = self.read_line()?;
        Ok(matches!(line.as_str(), "y" | "Y" | "yes" | "Yes"))
    }

    fn menu(&mut self, label: &str, choices: &[String]) -> Result<usize> {
        loop {
            println!("{label}:");
            println!("  0 | None of the Above");
            for (idx, choice) in choices.iter().enumerate() {
                println!("  {} | {choice}", idx + 1);
            }
            print!("Choice: ");
            io::stdout().flush()?;
            let line = self.read_line()?;
            match line.parse::<usize>() {
                Ok(index) if index <= choices.len() => return Ok(index),
                _ => println!("Enter a number between 0 and {}", choices.len()),
            }
        }
    }
}

/// Scripted prompter for tests: answers are consumed front to back.
#[cfg(test)]
pub struct Scripted {
    pub prompts: Vec<Option<String>>,
    pub confirms: Vec<bool>,
    pub menu_picks: Vec<usize>,
    pub menus_shown: usize,
}

#[cfg(test)]
impl Scripted {
    pub fn new() -> Self {
        Self {
            prompts: Vec::new(),
            confirms: Vec::new(),
            menu_picks: Vec::new(),
            menus_shown: 0,
        }
    }

    pub fn with_menu_picks(picks: &[usize]) -> Self {
        let mut scripted = Self::new();
        scripted.menu_picks = picks.to_vec();
        scripted
    }
}

#[cfg(test)]
impl Prompter for Scripted {
    fn prompt(&mut self, _label: &str) -> Result<Option<String>> {
        if self.prompts.is_empty() {
            return Ok(None);
        }
        Ok(self.prompts.remove(0))
    }

    fn confirm(&mut self, _label: &str) -> Result<bool> {
        if self.confirms.is_empty() {
            return Ok(false);
        }
        Ok(self.confirms.remove(0))
    }

    fn menu(&mut self, _label: &str, choices: &[String]) -> Result<usize> {
        self.menus_shown += 1;
        if self.menu_picks.is_empty() {
            return Ok(0);
        }
        let pick = self.menu_picks.remove(0);
        Ok(pick.min(choices.len()))
    }
}
