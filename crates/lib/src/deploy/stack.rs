//! Running stack discovery and runtime mode inference.

use std::collections::BTreeMap;

use tracing::debug;

use super::{DeployError, Inference, TargetStack};
use crate::consts::{COMPOSE_CONFIG_FILES_LABEL, COMPOSE_PROJECT_LABEL, COMPOSE_SERVICE_LABEL};
use crate::container::{ClientFactory, ContainerError, ContainerFilter, ContainerSummary};
use crate::interaction::Prompter;
use crate::runtime::{ServiceState, infer_mode_from_compose_files, infer_mode_from_services};

/// Services that identify a stack, lower value = more authoritative naming.
const SERVICE_PRIORITY: &[(&str, u8)] = &[
  ("gateway", 0),
  ("runtime-node", 1),
  ("agent", 2),
  ("database", 3),
  ("s3-storage", 4),
  ("victorialogs", 5),
  ("provisioner", 6),
  ("coredns", 7),
];

fn service_priority(service: &str) -> Option<u8> {
  SERVICE_PRIORITY.iter().find(|(name, _)| *name == service).map(|(_, p)| *p)
}

/// `esb-dev` from container `esb-dev-gateway` and service `gateway`.
pub fn stack_from_service_name(container_name: &str, service: &str) -> Option<String> {
  let name = container_name.trim();
  let service = service.trim();
  if name.is_empty() || service.is_empty() {
    return None;
  }
  let stack = name.strip_suffix(service)?.strip_suffix('-')?.trim();
  (!stack.is_empty()).then(|| stack.to_string())
}

/// Last `-` segment of a stack name, if there are at least two.
pub fn env_from_stack_name(stack: &str) -> Option<String> {
  let (_, env) = stack.trim().rsplit_once('-')?;
  let env = env.trim();
  (!env.is_empty()).then(|| env.to_string())
}

/// Group running containers into stacks, sorted by name.
///
/// Containers without a recognized service label are ignored. When several
/// containers name the same stack, the most authoritative service supplies
/// the entry and a missing project label is filled from the others.
pub fn extract_stacks(containers: &[ContainerSummary]) -> Vec<TargetStack> {
  let mut stacks: BTreeMap<String, (u8, TargetStack)> = BTreeMap::new();
  for container in containers {
    let Some(service) = container.label(COMPOSE_SERVICE_LABEL) else {
      continue;
    };
    let Some(priority) = service_priority(service) else {
      continue;
    };
    let Some(name) = stack_from_service_name(container.primary_name(), service) else {
      continue;
    };
    let entry = TargetStack {
      env: env_from_stack_name(&name).unwrap_or_default(),
      project: container.label(COMPOSE_PROJECT_LABEL).unwrap_or_default().to_string(),
      name: name.clone(),
    };
    match stacks.get_mut(&name) {
      None => {
        stacks.insert(name, (priority, entry));
      }
      Some((existing_priority, existing)) => {
        if priority < *existing_priority {
          let mut entry = entry;
          if entry.project.is_empty() {
            entry.project = std::mem::take(&mut existing.project);
          }
          *existing = entry;
          *existing_priority = priority;
        } else if existing.project.is_empty() && !entry.project.is_empty() {
          existing.project = entry.project;
        }
      }
    }
  }
  stacks.into_values().map(|(_, stack)| stack).collect()
}

/// List running stacks.
pub fn discover_stacks(factory: &dyn ClientFactory) -> Result<Vec<TargetStack>, ContainerError> {
  let client = factory.connect()?;
  let containers = client.list_containers(&ContainerFilter::running())?;
  let stacks = extract_stacks(&containers);
  debug!(count = stacks.len(), "discovered running stacks");
  Ok(stacks)
}

/// Pick the stack to deploy into.
///
/// One stack is taken as is. Several are offered as a select when a
/// prompter is available and are an error otherwise.
pub fn select_stack(stacks: &[TargetStack], prompter: Option<&dyn Prompter>) -> Result<Option<TargetStack>, DeployError> {
  match stacks {
    [] => return Ok(None),
    [only] => return Ok(Some(only.clone())),
    _ => {}
  }
  let names: Vec<String> = stacks.iter().map(|s| s.name.clone()).collect();
  let Some(prompter) = prompter else {
    return Err(DeployError::MultipleRunningStacks(names));
  };
  let selected = prompter
    .select("Target stack (running)", &names)
    .map_err(DeployError::prompt("target stack"))?;
  let selected = selected.trim();
  Ok(stacks.iter().find(|s| s.name == selected).cloned())
}

/// Infer the runtime mode of a compose project from its containers.
///
/// Running services are consulted first, then every container, then the
/// compose files recorded in the config-files label.
pub fn infer_mode(factory: &dyn ClientFactory, project: &str) -> Result<Option<Inference>, ContainerError> {
  let project = project.trim();
  if project.is_empty() {
    return Ok(None);
  }
  let client = factory.connect()?;
  let filter = ContainerFilter::all().with_label(COMPOSE_PROJECT_LABEL, project);
  let containers = client.list_containers(&filter)?;

  let services: Vec<ServiceState> = containers
    .iter()
    .map(|c| ServiceState {
      service: c.label(COMPOSE_SERVICE_LABEL).unwrap_or_default().to_string(),
      state: c.state.trim().to_string(),
    })
    .collect();
  if let Some(mode) = infer_mode_from_services(&services, true) {
    return Ok(Some(Inference::new(mode.as_str(), "running_services")));
  }
  if let Some(mode) = infer_mode_from_services(&services, false) {
    return Ok(Some(Inference::new(mode.as_str(), "services")));
  }

  let files: Vec<&str> = containers
    .iter()
    .filter_map(|c| c.label(COMPOSE_CONFIG_FILES_LABEL))
    .flat_map(|files| files.split(','))
    .map(str::trim)
    .filter(|f| !f.is_empty())
    .collect();
  Ok(infer_mode_from_compose_files(&files).map(|mode| Inference::new(mode.as_str(), "config_files")))
}
