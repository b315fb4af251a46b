//! Line-based terminal prompter.
//!
//! Questions go to stderr so stdout stays clean for results. Selects accept
//! either the option number or its text; an empty answer picks the first
//! option, which is always the default.

use std::io::{self, BufRead, IsTerminal, Write};

use esb_lib::interaction::{PromptError, Prompter, SelectOption};

#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
  /// A prompter when both stdin and stderr are terminals.
  pub fn detect() -> Option<Self> {
    (io::stdin().is_terminal() && io::stderr().is_terminal()).then_some(TerminalPrompter)
  }

  fn read_line(&self) -> Result<String, PromptError> {
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
      return Err(PromptError::Cancelled);
    }
    Ok(line.trim().to_string())
  }

  /// Index of the chosen option among `labels`.
  fn choose(&self, title: &str, labels: &[&str]) -> Result<usize, PromptError> {
    if labels.is_empty() {
      return Err(PromptError::NoOptions(title.to_string()));
    }
    let mut err = io::stderr();
    writeln!(err, "{}", title)?;
    for (i, label) in labels.iter().enumerate() {
      writeln!(err, "  {}) {}", i + 1, label)?;
    }
    loop {
      write!(err, "> ")?;
      err.flush()?;
      let answer = self.read_line()?;
      if answer.is_empty() {
        return Ok(0);
      }
      if let Ok(n) = answer.parse::<usize>()
        && (1..=labels.len()).contains(&n)
      {
        return Ok(n - 1);
      }
      if let Some(i) = labels.iter().position(|l| *l == answer) {
        return Ok(i);
      }
      writeln!(err, "Choose 1-{} or type an option.", labels.len())?;
    }
  }
}

impl Prompter for TerminalPrompter {
  fn input(&self, title: &str, suggestions: &[String]) -> Result<String, PromptError> {
    let mut err = io::stderr();
    if suggestions.is_empty() {
      write!(err, "{}: ", title)?;
    } else {
      write!(err, "{} [{}]: ", title, suggestions.join(", "))?;
    }
    err.flush()?;
    self.read_line()
  }

  fn select(&self, title: &str, options: &[String]) -> Result<String, PromptError> {
    let labels: Vec<&str> = options.iter().map(String::as_str).collect();
    let index = self.choose(title, &labels)?;
    Ok(options[index].clone())
  }

  fn select_value(&self, title: &str, options: &[SelectOption]) -> Result<String, PromptError> {
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    let index = self.choose(title, &labels)?;
    Ok(options[index].value.clone())
  }
}
