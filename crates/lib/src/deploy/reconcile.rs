//! Arbitration between an intended value and the value observed at runtime.
//!
//! The same rules apply to the environment and the runtime mode:
//!
//! ```text
//! inferred empty or equal ............ keep choice
//! force and choice set ............... keep choice, warn
//! choice unset ....................... adopt inferred (implicit)
//! prompter available ................. ask: use inferred / keep current
//! explicit, no prompter .............. mismatch error
//! implicit, no prompter .............. adopt inferred (implicit)
//! ```

use tracing::debug;

use super::{Axis, DeployError, Inference, ValueChoice, source};
use crate::interaction::{Prompter, Reporter, SelectOption};

/// Outcome of comparing a choice with an inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  /// Nothing to reconcile.
  Keep,
  /// Disagreement overridden by `--force`.
  KeepForced,
  /// Take the inferred value as a non-explicit choice.
  Adopt,
  /// Let the operator pick.
  Ask,
  /// Explicit disagreement with no way to ask.
  Reject,
}

/// Decide how to reconcile `choice` with `inferred`.
pub fn decide(choice: &ValueChoice, inferred: Option<&Inference>, force: bool, interactive: bool) -> Decision {
  let Some(inferred) = inferred.filter(|i| !i.value.trim().is_empty()) else {
    return Decision::Keep;
  };
  if inferred.value == choice.value {
    return Decision::Keep;
  }
  if force && !choice.is_unset() {
    return Decision::KeepForced;
  }
  if choice.is_unset() {
    return Decision::Adopt;
  }
  if interactive {
    return Decision::Ask;
  }
  if choice.explicit {
    Decision::Reject
  } else {
    Decision::Adopt
  }
}

fn adopt(inferred: &Inference) -> ValueChoice {
  ValueChoice::implicit(inferred.value.clone(), &inferred.source)
}

/// Apply an operator's answer to a mismatch prompt.
///
/// Either way the result is explicit. Keeping a value that was only a
/// default promotes its source to `prompt`.
pub fn apply_selection(current: ValueChoice, inferred: &Inference, selected: &str) -> ValueChoice {
  if selected == inferred.value {
    return ValueChoice::explicit(inferred.value.clone(), &inferred.source);
  }
  let source = if current.source == source::DEFAULT {
    source::PROMPT.to_string()
  } else {
    current.source
  };
  ValueChoice {
    value: current.value,
    source,
    explicit: true,
  }
}

fn ask(axis: Axis, current: &ValueChoice, inferred: &Inference, prompter: &dyn Prompter) -> Result<String, DeployError> {
  let title = format!(
    "{} mismatch (running: {}, current: {})",
    axis.title(),
    inferred.value,
    current.value
  );
  let options = [
    SelectOption::new(
      format!("Use running {} \"{}\" (recommended)", axis.short(), inferred.value),
      inferred.value.clone(),
    ),
    SelectOption::new(
      format!("Keep current {} \"{}\"", axis.short(), current.value),
      current.value.clone(),
    ),
  ];
  prompter
    .select_value(&title, &options)
    .map_err(DeployError::prompt(format!("{} mismatch", axis)))
}

/// Reconcile `choice` with what the running stack reports.
pub fn reconcile(
  axis: Axis,
  choice: ValueChoice,
  inferred: Option<&Inference>,
  force: bool,
  prompter: Option<&dyn Prompter>,
  reporter: &dyn Reporter,
) -> Result<ValueChoice, DeployError> {
  let decision = decide(&choice, inferred, force, prompter.is_some());
  debug!(%axis, ?decision, current = %choice.value, inferred = ?inferred.map(|i| &i.value), "reconciling");
  match (decision, inferred, prompter) {
    (Decision::Ask, Some(inferred), Some(prompter)) => {
      let selected = ask(axis, &choice, inferred, prompter)?;
      Ok(apply_selection(choice, inferred, selected.trim()))
    }
    _ => finish(axis, decision, choice, inferred, reporter),
  }
}

fn finish(
  axis: Axis,
  decision: Decision,
  choice: ValueChoice,
  inferred: Option<&Inference>,
  reporter: &dyn Reporter,
) -> Result<ValueChoice, DeployError> {
  let Some(inferred) = inferred else {
    return Ok(choice);
  };
  match decision {
    Decision::Keep | Decision::Ask => Ok(choice),
    Decision::KeepForced => {
      reporter.warn(&format!(
        "{} mismatch (running=\"{}\", deploy=\"{}\"); keeping \"{}\" due to {}",
        axis,
        inferred.value,
        choice.value,
        choice.value,
        axis.flag()
      ));
      Ok(choice)
    }
    Decision::Adopt => Ok(adopt(inferred)),
    Decision::Reject => Err(DeployError::Mismatch {
      axis,
      current: choice.value,
      current_source: choice.source,
      inferred: inferred.value.clone(),
      inferred_source: inferred.source.clone(),
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{RecordingReporter, ScriptedPrompter};

  fn running(value: &str) -> Inference {
    Inference::new(value, "gateway env")
  }

  fn flag(value: &str) -> ValueChoice {
    ValueChoice::explicit(value.to_string(), source::FLAG)
  }

  fn default(value: &str) -> ValueChoice {
    ValueChoice::implicit(value.to_string(), source::DEFAULT)
  }

  mod decisions {
    use super::*;

    #[test]
    fn no_or_equal_inference_keeps() {
      assert_eq!(decide(&flag("dev"), None, false, false), Decision::Keep);
      assert_eq!(decide(&flag("dev"), Some(&running("dev")), false, false), Decision::Keep);
      assert_eq!(decide(&flag("dev"), Some(&running(" ")), false, false), Decision::Keep);
    }

    #[test]
    fn force_beats_everything_when_set() {
      for interactive in [true, false] {
        assert_eq!(decide(&flag("dev"), Some(&running("prod")), true, interactive), Decision::KeepForced);
        assert_eq!(decide(&default("dev"), Some(&running("prod")), true, interactive), Decision::KeepForced);
      }
    }

    #[test]
    fn unset_choice_adopts_silently() {
      for (force, interactive) in [(false, false), (true, true), (false, true)] {
        assert_eq!(
          decide(&ValueChoice::default(), Some(&running("prod")), force, interactive),
          Decision::Adopt
        );
      }
    }

    #[test]
    fn interactive_mismatch_asks() {
      assert_eq!(decide(&flag("dev"), Some(&running("prod")), false, true), Decision::Ask);
      assert_eq!(decide(&default("dev"), Some(&running("prod")), false, true), Decision::Ask);
    }

    #[test]
    fn non_interactive_asymmetry() {
      assert_eq!(decide(&flag("dev"), Some(&running("prod")), false, false), Decision::Reject);
      assert_eq!(decide(&default("dev"), Some(&running("prod")), false, false), Decision::Adopt);
    }
  }

  mod outcomes {
    use super::*;

    #[test]
    fn forced_explicit_choice_is_unchanged_with_warning() {
      let reporter = RecordingReporter::default();
      for inferred in ["prod", "qa", "x"] {
        let out = reconcile(Axis::Environment, flag("dev"), Some(&running(inferred)), true, None, &reporter).unwrap();
        assert_eq!(out, flag("dev"));
      }
      let messages = reporter.messages();
      assert_eq!(messages.len(), 3);
      assert_eq!(
        messages[0],
        "environment mismatch (running=\"prod\", deploy=\"dev\"); keeping \"dev\" due to --force"
      );
    }

    #[test]
    fn implicit_choice_adopts_inferred_source() {
      let reporter = RecordingReporter::default();
      for inferred in [Inference::new("prod", "gateway env"), Inference::new("qa", "staging")] {
        let out = reconcile(Axis::Environment, default("dev"), Some(&inferred), false, None, &reporter).unwrap();
        assert_eq!(out.value, inferred.value);
        assert_eq!(out.source, inferred.source);
        assert!(!out.explicit);
      }
      assert!(reporter.messages().is_empty());
    }

    #[test]
    fn explicit_non_interactive_mismatch_errors() {
      let reporter = RecordingReporter::default();
      let err = reconcile(Axis::Environment, flag("dev"), Some(&running("prod")), false, None, &reporter).unwrap_err();
      let message = err.to_string();
      assert!(message.contains("\"dev\""), "{message}");
      assert!(message.contains("\"prod\""), "{message}");
      assert!(message.contains("--force"), "{message}");
    }

    #[test]
    fn prompt_choosing_inferred_is_explicit() {
      let reporter = RecordingReporter::default();
      let prompter = ScriptedPrompter::new(["prod"]);
      let out = reconcile(
        Axis::Environment,
        default("dev"),
        Some(&running("prod")),
        false,
        Some(&prompter),
        &reporter,
      )
      .unwrap();
      assert_eq!(out, ValueChoice::explicit("prod".to_string(), "gateway env"));

      let calls = prompter.calls();
      assert_eq!(calls[0].title, "Environment mismatch (running: prod, current: dev)");
      assert_eq!(
        calls[0].choices,
        vec!["Use running env \"prod\" (recommended)", "Keep current env \"dev\""]
      );
    }

    #[test]
    fn prompt_keeping_default_promotes_source() {
      let reporter = RecordingReporter::default();
      let prompter = ScriptedPrompter::new(["dev"]);
      let out = reconcile(
        Axis::Environment,
        default("dev"),
        Some(&running("prod")),
        false,
        Some(&prompter),
        &reporter,
      )
      .unwrap();
      assert_eq!(out, ValueChoice::explicit("dev".to_string(), "prompt"));

      // A second pass with the promoted choice is asked again, not collapsed.
      assert_eq!(decide(&out, Some(&running("prod")), false, true), Decision::Ask);
    }

    #[test]
    fn prompt_keeping_flag_keeps_flag_source() {
      let reporter = RecordingReporter::default();
      let prompter = ScriptedPrompter::new(["dev"]);
      let out = reconcile(Axis::Mode, flag("dev"), Some(&running("prod")), false, Some(&prompter), &reporter).unwrap();
      assert_eq!(out, flag("dev"));
      assert!(prompter.titles()[0].starts_with("Runtime mode mismatch"));
    }

    #[test]
    fn cancelled_prompt_is_error() {
      let reporter = RecordingReporter::default();
      let prompter = ScriptedPrompter::new(Vec::<String>::new());
      let err = reconcile(Axis::Environment, flag("dev"), Some(&running("prod")), false, Some(&prompter), &reporter);
      assert!(matches!(err, Err(DeployError::Prompt { .. })));
    }
  }
}
