//! Deploy input resolution.
//!
//! A deploy needs one consistent answer for the compose project, the
//! environment, the runtime mode, the artifact root and, per template, its
//! parameters and image settings. Each answer is drawn from a fixed
//! priority chain of CLI flags, process variables, stored defaults, the
//! running container fleet and interactive prompts, and keeps a record of
//! where it came from.
//!
//! ```text
//! resolve_deploy_inputs
//!   ├── stack::discover_stacks / select_stack
//!   ├── values::resolve_project / resolve_env / resolve_mode
//!   ├── reconcile (env and mode vs. the running fleet)
//!   ├── templates / params / images
//!   ├── artifact identity
//!   └── summary::confirm  ── edit ──▶ next pass with previous answers
//! ```
//!
//! Collaborators (prompter, reporter, container client factory, env
//! resolver, template parser) are injected through [`DeployContext`].

mod apply;
mod compose;
mod error;
mod flow;
mod images;
mod params;
mod reconcile;
mod stack;
mod summary;
mod templates;
mod types;
mod values;

pub mod env_resolver;

pub use apply::{build_artifact_manifest, manifest_path, write_artifact_manifest};
pub use compose::normalize_compose_files;
pub use env_resolver::{EnvResolver, FleetEnvResolver};
pub use error::{Axis, DeployError};
pub use flow::{DeployContext, resolve_deploy_inputs};
pub use images::{
  IMAGE_RUNTIME_FLAG, IMAGE_URI_FLAG, filter_overrides, parse_overrides, resolve_image_runtimes,
  resolve_image_sources,
};
pub use params::resolve_parameters;
pub use reconcile::{Decision, apply_selection, decide, reconcile};
pub use stack::{discover_stacks, env_from_stack_name, extract_stacks, infer_mode, select_stack, stack_from_service_name};
pub use summary::{Confirmation, confirm, render_summary};
pub use templates::{TemplateSearch, build_suggestions, discover_candidates, normalize_template_path};
pub use types::*;
pub use values::{
  default_project_name, explicit_project, project_for_env, prompt_env, prompt_mode, resolve_artifact_root,
  resolve_env, resolve_mode, resolve_project,
};
