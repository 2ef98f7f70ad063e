//! # dtm-workspace
//!
//! Provisioning of client/project workspaces.
//!
//! A workspace is a `clients/<client>/projects/<project>/` directory of
//! generated token files plus one entry in the [`ManifestRegistry`], the
//! single document recording every workspace that exists.
//!
//! [`WorkspaceProvisioner::create_project`] checks the registry, writes the
//! template files, and writes the registry last, all under one lock, so two
//! concurrent requests for the same key resolve to one success and one
//! [`WorkspaceError::ProjectExists`].

pub mod error;
pub mod manifest;
pub mod provisioner;
pub mod template;

pub use error::WorkspaceError;
pub use manifest::{ManifestDocument, ManifestProject, ManifestRegistry, ProjectMetadata};
pub use provisioner::{CreateProjectRequest, CreatedProject, WorkspaceProvisioner};
pub use template::Template;
