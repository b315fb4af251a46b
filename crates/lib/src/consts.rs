//! Product-wide names and fixed values.

/// Application slug, used as the default compose project prefix.
pub const APP_NAME: &str = "esb";

/// Per-project state directory.
pub const HOME_DIR: &str = ".esb";

/// Global config file name inside [`HOME_DIR`].
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Artifact manifest file name.
pub const ARTIFACT_MANIFEST_FILENAME: &str = "artifact.yml";

/// Length of the truncated artifact ID.
pub const ARTIFACT_ID_LEN: usize = 20;

/// Number of template paths remembered for suggestions.
pub const TEMPLATE_HISTORY_LIMIT: usize = 10;

/// Environment name used when nothing else is known.
pub const DEFAULT_ENV: &str = "default";

/// Process variable naming the compose project.
pub const ENV_PROJECT_NAME: &str = "ESB_PROJECT_NAME";

/// Process variable holding the prefix for host-level variables (e.g. `ESB`).
pub const ENV_PREFIX: &str = "ENV_PREFIX";

/// Process variable overriding the product prefix of default project names.
pub const ENV_CLI_CMD: &str = "CLI_CMD";

/// Host-level variable suffixes, combined as `<ENV_PREFIX>_<suffix>`.
pub const HOST_SUFFIX_PROJECT: &str = "PROJECT";
pub const HOST_SUFFIX_REPO: &str = "REPO";
pub const HOST_SUFFIX_STAGING_DIR: &str = "STAGING_DIR";
pub const HOST_SUFFIX_STAGING_HOME: &str = "STAGING_HOME";

/// Compose labels.
pub const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
pub const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";
pub const COMPOSE_CONFIG_FILES_LABEL: &str = "com.docker.compose.project.config_files";
pub const ENV_LABEL: &str = "com.esb.env";

/// Gateway service name and its runtime config mount point.
pub const GATEWAY_SERVICE: &str = "gateway";
pub const RUNTIME_CONFIG_MOUNT_PATH: &str = "/app/runtime-config";

/// Services whose presence identifies the runtime backend.
pub const CONTAINERD_SERVICE: &str = "runtime-node";
pub const DOCKER_SERVICE: &str = "agent";

/// Compose files that mark the project root.
pub const REPO_MARKERS: &[&str] = &["docker-compose.docker.yml", "docker-compose.containerd.yml"];

/// Template file names probed when a directory is given.
pub const TEMPLATE_FILENAMES: &[&str] = &["template.yaml", "template.yml"];
