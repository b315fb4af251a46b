mod artifact;
mod deploy;

pub use artifact::{ArtifactCommand, cmd_artifact};
pub use deploy::{DeployArgs, cmd_deploy};
