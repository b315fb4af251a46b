//! Deterministic fakes for the collaborator traits.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use crate::container::{ClientFactory, ContainerClient, ContainerDetails, ContainerError, ContainerFilter, ContainerSummary};
use crate::deploy::{EnvResolver, Inference};
use crate::interaction::{PromptError, Prompter, Reporter, SelectOption};

/// Build a container summary.
pub fn container(id: &str, name: &str, state: &str, labels: &[(&str, &str)]) -> ContainerSummary {
  ContainerSummary {
    id: id.to_string(),
    names: vec![format!("/{}", name)],
    labels: labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    state: state.to_string(),
  }
}

/// In-memory container fleet.
#[derive(Debug, Default)]
pub struct FakeClientFactory {
  containers: Vec<ContainerSummary>,
  details: BTreeMap<String, ContainerDetails>,
  unavailable: bool,
}

impl FakeClientFactory {
  pub fn new(containers: Vec<ContainerSummary>) -> Self {
    Self {
      containers,
      ..Self::default()
    }
  }

  /// A factory whose every connection fails.
  pub fn unavailable() -> Self {
    Self {
      unavailable: true,
      ..Self::default()
    }
  }

  pub fn with_details(mut self, id: &str, details: ContainerDetails) -> Self {
    self.details.insert(id.to_string(), details);
    self
  }
}

struct FakeClient<'a> {
  fleet: &'a FakeClientFactory,
}

impl ContainerClient for FakeClient<'_> {
  fn list_containers(&self, filter: &ContainerFilter) -> Result<Vec<ContainerSummary>, ContainerError> {
    Ok(self.fleet.containers.iter().filter(|c| filter.matches(c)).cloned().collect())
  }

  fn inspect_container(&self, id: &str) -> Result<ContainerDetails, ContainerError> {
    self
      .fleet
      .details
      .get(id)
      .cloned()
      .ok_or_else(|| ContainerError::NotFound(id.to_string()))
  }
}

impl ClientFactory for FakeClientFactory {
  fn connect(&self) -> Result<Box<dyn ContainerClient + '_>, ContainerError> {
    if self.unavailable {
      return Err(ContainerError::CommandFailed {
        command: "docker ps".to_string(),
        code: Some(1),
        stderr: "Cannot connect to the Docker daemon".to_string(),
      });
    }
    Ok(Box::new(FakeClient { fleet: self }))
  }
}

/// One question asked of a [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCall {
  pub title: String,
  /// Suggestions for input, option strings for selects, option labels for
  /// labelled selects.
  pub choices: Vec<String>,
}

/// Answers questions from a fixed script, in order.
///
/// Running out of answers cancels the prompt.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
  answers: RefCell<VecDeque<String>>,
  calls: RefCell<Vec<PromptCall>>,
}

impl ScriptedPrompter {
  pub fn new<I, S>(answers: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
      calls: RefCell::new(Vec::new()),
    }
  }

  pub fn calls(&self) -> Vec<PromptCall> {
    self.calls.borrow().clone()
  }

  pub fn titles(&self) -> Vec<String> {
    self.calls.borrow().iter().map(|c| c.title.clone()).collect()
  }

  /// Answers not consumed yet.
  pub fn remaining(&self) -> usize {
    self.answers.borrow().len()
  }

  fn answer(&self, title: &str, choices: Vec<String>) -> Result<String, PromptError> {
    self.calls.borrow_mut().push(PromptCall {
      title: title.to_string(),
      choices,
    });
    self.answers.borrow_mut().pop_front().ok_or(PromptError::Cancelled)
  }
}

impl Prompter for ScriptedPrompter {
  fn input(&self, title: &str, suggestions: &[String]) -> Result<String, PromptError> {
    self.answer(title, suggestions.to_vec())
  }

  fn select(&self, title: &str, options: &[String]) -> Result<String, PromptError> {
    self.answer(title, options.to_vec())
  }

  fn select_value(&self, title: &str, options: &[SelectOption]) -> Result<String, PromptError> {
    self.answer(title, options.iter().map(|o| o.label.clone()).collect())
  }
}

/// Collects warnings.
#[derive(Debug, Default)]
pub struct RecordingReporter {
  messages: RefCell<Vec<String>>,
}

impl RecordingReporter {
  pub fn messages(&self) -> Vec<String> {
    self.messages.borrow().clone()
  }
}

impl Reporter for RecordingReporter {
  fn warn(&self, message: &str) {
    self.messages.borrow_mut().push(message.to_string());
  }
}

/// Always infers the same environment.
#[derive(Debug, Default)]
pub struct FixedEnvResolver {
  inference: Option<Inference>,
  calls: Cell<usize>,
}

impl FixedEnvResolver {
  pub fn new(value: &str, source: &str) -> Self {
    Self {
      inference: Some(Inference::new(value, source)),
      calls: Cell::new(0),
    }
  }

  pub fn none() -> Self {
    Self::default()
  }

  pub fn calls(&self) -> usize {
    self.calls.get()
  }
}

impl EnvResolver for FixedEnvResolver {
  fn infer_env(&self, _project: &str, _template_path: Option<&Path>, _reporter: &dyn Reporter) -> Option<Inference> {
    self.calls.set(self.calls.get() + 1);
    self.inference.clone()
  }
}
