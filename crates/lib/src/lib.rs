//! esb-lib: deploy input resolution for the esb CLI
//!
//! This crate resolves one consistent set of deploy inputs from CLI flags,
//! the process environment, stored defaults, the running container fleet and
//! interactive answers, then records the result as an artifact manifest:
//! - `deploy`: stack discovery, value resolution, runtime reconciliation and the confirm loop
//! - `template`: SAM-style template parsing, parameter and image-function resolution
//! - `artifact`: content-addressed artifact identity and the `artifact.yml` model
//! - `container`: container fleet client capability and the docker CLI implementation
//! - `config`: persisted per-template defaults and project root discovery

pub mod artifact;
pub mod config;
pub mod consts;
pub mod container;
pub mod deploy;
pub mod env;
pub mod interaction;
pub mod runtime;
pub mod staging;
pub mod template;
pub mod util;
