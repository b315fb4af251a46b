//! Operator interaction capabilities.
//!
//! Resolution code never touches the terminal. It asks questions through a
//! [`Prompter`] and reports recoverable problems through a [`Reporter`]; the
//! CLI supplies terminal-backed implementations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
  #[error("prompt cancelled")]
  Cancelled,

  #[error("no options to select from for '{0}'")]
  NoOptions(String),

  #[error("failed to read answer: {0}")]
  Io(#[from] std::io::Error),
}

/// One entry of a labelled selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
  /// Text shown to the operator.
  pub label: String,
  /// Value returned when chosen.
  pub value: String,
}

impl SelectOption {
  pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      value: value.into(),
    }
  }
}

/// Interactive questions.
pub trait Prompter {
  /// Free-form single line; `suggestions` are offered for completion.
  fn input(&self, title: &str, suggestions: &[String]) -> Result<String, PromptError>;

  /// Pick one of `options`, returning the chosen string.
  fn select(&self, title: &str, options: &[String]) -> Result<String, PromptError>;

  /// Pick one labelled option, returning its value.
  fn select_value(&self, title: &str, options: &[SelectOption]) -> Result<String, PromptError>;
}

/// Sink for operator-facing warnings that never abort a run.
pub trait Reporter {
  fn warn(&self, message: &str);
}
