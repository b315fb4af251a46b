//! Environment inference from the running fleet and staged configs.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::Inference;
use crate::consts::{COMPOSE_PROJECT_LABEL, COMPOSE_SERVICE_LABEL, ENV_LABEL, GATEWAY_SERVICE, RUNTIME_CONFIG_MOUNT_PATH};
use crate::container::{ClientFactory, ContainerError, ContainerFilter, ContainerSummary, env_list_to_map};
use crate::env::HostEnv;
use crate::interaction::Reporter;
use crate::staging;

pub const SOURCE_CONTAINER_LABEL: &str = "container label";
pub const SOURCE_GATEWAY_ENV: &str = "gateway env";
pub const SOURCE_GATEWAY_MOUNT: &str = "gateway config mount";
pub const SOURCE_STAGING: &str = "staging";

/// Infers which environment a compose project is currently deployed as.
pub trait EnvResolver {
  /// First stable answer across all probes, or `None`.
  ///
  /// Probe failures are reported as warnings and never abort inference.
  fn infer_env(&self, project: &str, template_path: Option<&Path>, reporter: &dyn Reporter) -> Option<Inference>;
}

/// Probes, in order: a unique env label on the project's running
/// containers, the gateway container's `ENV` variable or config bind mount,
/// then the staged config directories.
pub struct FleetEnvResolver<'a> {
  factory: &'a dyn ClientFactory,
  host: &'a HostEnv,
  cwd: PathBuf,
}

impl<'a> FleetEnvResolver<'a> {
  pub fn new(factory: &'a dyn ClientFactory, host: &'a HostEnv, cwd: impl Into<PathBuf>) -> Self {
    Self {
      factory,
      host,
      cwd: cwd.into(),
    }
  }

  fn staging_root(&self, template_path: Option<&Path>) -> PathBuf {
    staging::root_dir(self.host, &self.cwd, template_path)
  }

  fn from_labels(&self, project: &str) -> Result<Option<Inference>, ContainerError> {
    let client = self.factory.connect()?;
    let containers = client.list_containers(&ContainerFilter::running().with_label(COMPOSE_PROJECT_LABEL, project))?;
    Ok(env_from_labels(&containers))
  }

  fn from_gateway(&self, project: &str, template_path: Option<&Path>) -> Result<Option<Inference>, ContainerError> {
    let client = self.factory.connect()?;
    let filter = ContainerFilter::all()
      .with_label(COMPOSE_SERVICE_LABEL, GATEWAY_SERVICE)
      .with_label(COMPOSE_PROJECT_LABEL, project);
    let containers = client.list_containers(&filter)?;
    let Some(gateway) = select_gateway(&containers) else {
      return Ok(None);
    };
    let details = client.inspect_container(&gateway.id)?;

    let env = env_list_to_map(&details.env);
    if let Some(value) = env.get("ENV").map(|v| v.trim()).filter(|v| !v.is_empty()) {
      return Ok(Some(Inference::new(value, SOURCE_GATEWAY_ENV)));
    }

    let root = self.staging_root(template_path);
    let from_mount = details
      .mounts
      .iter()
      .filter(|m| m.destination == RUNTIME_CONFIG_MOUNT_PATH && m.kind.eq_ignore_ascii_case("bind"))
      .find_map(|m| staging::env_from_config_path(&m.source, &root));
    Ok(from_mount.map(|env| Inference::new(env, SOURCE_GATEWAY_MOUNT)))
  }

  fn from_staging(&self, project: &str, template_path: Option<&Path>) -> std::io::Result<Option<Inference>> {
    let envs = staging::discover_envs(&self.staging_root(template_path), project)?;
    match envs.as_slice() {
      [only] => Ok(Some(Inference::new(only.as_str(), SOURCE_STAGING))),
      _ => Ok(None),
    }
  }
}

impl EnvResolver for FleetEnvResolver<'_> {
  fn infer_env(&self, project: &str, template_path: Option<&Path>, reporter: &dyn Reporter) -> Option<Inference> {
    let project = project.trim();
    if project.is_empty() {
      return None;
    }

    match self.from_labels(project) {
      Ok(Some(found)) => return Some(found),
      Ok(None) => {}
      Err(e) => reporter.warn(&format!("failed to inspect container env labels: {}", e)),
    }
    match self.from_gateway(project, template_path) {
      Ok(Some(found)) => return Some(found),
      Ok(None) => {}
      Err(e) => reporter.warn(&format!("failed to inspect running gateway env: {}", e)),
    }
    match self.from_staging(project, template_path) {
      Ok(Some(found)) => return Some(found),
      Ok(None) => {}
      Err(e) => reporter.warn(&format!("failed to inspect staging env: {}", e)),
    }
    debug!(project, "no environment inferred");
    None
  }
}

/// Unique non-empty env label across `containers`.
pub fn env_from_labels(containers: &[ContainerSummary]) -> Option<Inference> {
  let envs: BTreeSet<&str> = containers.iter().filter_map(|c| c.label(ENV_LABEL)).collect();
  match envs.len() {
    1 => envs.into_iter().next().map(|env| Inference::new(env, SOURCE_CONTAINER_LABEL)),
    _ => None,
  }
}

/// Running gateways first, then by name.
fn select_gateway(containers: &[ContainerSummary]) -> Option<&ContainerSummary> {
  containers
    .iter()
    .min_by(|a, b| b.is_running().cmp(&a.is_running()).then_with(|| a.primary_name().cmp(b.primary_name())))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::container::{ContainerDetails, Mount};
  use crate::util::testutil::{FakeClientFactory, RecordingReporter, container};
  use std::fs;
  use tempfile::TempDir;

  fn gateway(id: &str, state: &str) -> ContainerSummary {
    container(
      id,
      &format!("demo-{id}-gateway"),
      state,
      &[("com.docker.compose.project", "demo"), ("com.docker.compose.service", "gateway")],
    )
  }

  fn host(staging: &Path) -> HostEnv {
    HostEnv::from_pairs([
      ("ENV_PREFIX", "ESB".to_string()),
      ("ESB_STAGING_DIR", staging.display().to_string()),
    ])
  }

  mod labels {
    use super::*;

    #[test]
    fn unique_label_wins() {
      let containers = vec![
        container("a", "x", "running", &[("com.esb.env", "dev")]),
        container("b", "y", "running", &[("com.esb.env", " dev ")]),
        container("c", "z", "running", &[]),
      ];
      assert_eq!(env_from_labels(&containers), Some(Inference::new("dev", "container label")));
    }

    #[test]
    fn conflicting_labels_infer_nothing() {
      let containers = vec![
        container("a", "x", "running", &[("com.esb.env", "dev")]),
        container("b", "y", "running", &[("com.esb.env", "prod")]),
      ];
      assert_eq!(env_from_labels(&containers), None);
    }
  }

  mod probes {
    use super::*;

    #[test]
    fn label_probe_runs_first() {
      let temp = TempDir::new().unwrap();
      let host = host(temp.path());
      let mut labelled = gateway("g1", "running");
      labelled.labels.insert("com.esb.env".to_string(), "qa".to_string());
      let factory = FakeClientFactory::new(vec![labelled]).with_details(
        "g1",
        ContainerDetails {
          env: vec!["ENV=prod".to_string()],
          mounts: Vec::new(),
        },
      );
      let reporter = RecordingReporter::default();
      let resolver = FleetEnvResolver::new(&factory, &host, temp.path());
      assert_eq!(
        resolver.infer_env("demo", None, &reporter),
        Some(Inference::new("qa", "container label"))
      );
    }

    #[test]
    fn gateway_env_variable() {
      let temp = TempDir::new().unwrap();
      let host = host(temp.path());
      let factory = FakeClientFactory::new(vec![gateway("g2", "exited"), gateway("g1", "running")]).with_details(
        "g1",
        ContainerDetails {
          env: vec!["PATH=/bin".to_string(), "ENV=prod".to_string()],
          mounts: Vec::new(),
        },
      );
      let reporter = RecordingReporter::default();
      let resolver = FleetEnvResolver::new(&factory, &host, temp.path());
      assert_eq!(
        resolver.infer_env("demo", None, &reporter),
        Some(Inference::new("prod", "gateway env"))
      );
      assert!(reporter.messages().is_empty());
    }

    #[test]
    fn gateway_config_mount_under_staging_root() {
      let temp = TempDir::new().unwrap();
      let host = host(temp.path());
      let source = temp.path().join("demo").join("stage").join("config");
      let factory = FakeClientFactory::new(vec![gateway("g1", "running")]).with_details(
        "g1",
        ContainerDetails {
          env: Vec::new(),
          mounts: vec![
            Mount {
              kind: "volume".to_string(),
              source: "/var/lib/x/other/config".to_string(),
              destination: "/app/runtime-config".to_string(),
            },
            Mount {
              kind: "bind".to_string(),
              source: source.display().to_string(),
              destination: "/app/runtime-config".to_string(),
            },
          ],
        },
      );
      let reporter = RecordingReporter::default();
      let resolver = FleetEnvResolver::new(&factory, &host, temp.path());
      assert_eq!(
        resolver.infer_env("demo", None, &reporter),
        Some(Inference::new("stage", "gateway config mount"))
      );
    }

    #[test]
    fn staging_scan_when_no_gateway() {
      let temp = TempDir::new().unwrap();
      let host = host(temp.path());
      fs::create_dir_all(temp.path().join("demo/dev/config")).unwrap();
      let factory = FakeClientFactory::new(Vec::new());
      let reporter = RecordingReporter::default();
      let resolver = FleetEnvResolver::new(&factory, &host, temp.path());
      assert_eq!(
        resolver.infer_env("demo", None, &reporter),
        Some(Inference::new("dev", "staging"))
      );
    }

    #[test]
    fn ambiguous_staging_infers_nothing() {
      let temp = TempDir::new().unwrap();
      let host = host(temp.path());
      fs::create_dir_all(temp.path().join("demo/dev/config")).unwrap();
      fs::create_dir_all(temp.path().join("demo/prod/config")).unwrap();
      let factory = FakeClientFactory::new(Vec::new());
      let reporter = RecordingReporter::default();
      let resolver = FleetEnvResolver::new(&factory, &host, temp.path());
      assert_eq!(resolver.infer_env("demo", None, &reporter), None);
    }

    #[test]
    fn failed_probes_warn_and_continue() {
      let temp = TempDir::new().unwrap();
      let host = host(temp.path());
      fs::create_dir_all(temp.path().join("demo/dev/config")).unwrap();
      let factory = FakeClientFactory::unavailable();
      let reporter = RecordingReporter::default();
      let resolver = FleetEnvResolver::new(&factory, &host, temp.path());

      assert_eq!(
        resolver.infer_env("demo", None, &reporter),
        Some(Inference::new("dev", "staging"))
      );
      let messages = reporter.messages();
      assert_eq!(messages.len(), 2);
      assert!(messages[0].starts_with("failed to inspect container env labels"));
      assert!(messages[1].starts_with("failed to inspect running gateway env"));
    }

    #[test]
    fn blank_project_skips_probes() {
      let temp = TempDir::new().unwrap();
      let host = host(temp.path());
      let factory = FakeClientFactory::unavailable();
      let reporter = RecordingReporter::default();
      let resolver = FleetEnvResolver::new(&factory, &host, temp.path());
      assert_eq!(resolver.infer_env("  ", None, &reporter), None);
      assert!(reporter.messages().is_empty());
    }
  }
}
