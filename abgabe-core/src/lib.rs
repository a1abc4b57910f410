//! abgabesystem core library — domain types, platform capability, roster, config.
//!
//! Public API surface:
//! - [`types`] — id newtypes, remote handles, [`StudentRecord`]
//! - [`platform`] — the [`Platform`] capability trait and [`PlatformError`]
//! - [`roster`] — Latin-1 CSV roster reader
//! - [`config`] — YAML configuration load / override
//! - [`error`] — [`RosterError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod platform;
pub mod roster;
pub mod types;

pub use config::{CheckerConfig, Config};
pub use error::{ConfigError, RosterError};
pub use platform::{
    CommitAction, NewCommit, NewGroup, NewProject, NewTag, NewUser, Platform, PlatformError,
};
pub use types::{
    AccessLevel, DeployKey, DeployKeyId, GroupId, ProjectId, ProjectSettings, RemoteGroup,
    RemoteMember, RemoteProject, RemoteUser, StudentRecord, Tag, UserId, Visibility,
};
