//! Container image engine integration.
//!
//! The image platform and the chart save step talk to Docker through
//! [`ImageEngine`]. [`DockerCli`] implements it on top of the `docker`
//! command line via a [`CommandRunner`](crate::release::utils::process::CommandRunner).

mod engine;

pub use engine::{DOCKER_START_HELP, DockerCli, ImageEngine};
