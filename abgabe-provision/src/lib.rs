//! # abgabe-provision
//!
//! Idempotent provisioning of a course on the hosting platform.
//!
//! Everything remote is converged through [`reconcile::reconcile`]
//! (find-or-create). On top of it:
//! - [`course`] — course group, `students` / `solutions` subgroups, reference project
//! - [`enroll`] — dummy accounts and enrollment for a roster
//! - [`projects`] — personal subgroup, fork, membership and deploy key per student
//! - [`deadline`] — deadline tags on the reference project and all forks
//! - [`plagiarism`] — clone tagged submissions and run the external checker
//! - [`collect`] — clone or update the submissions of one tutorial group

pub mod collect;
pub mod course;
pub mod deadline;
pub mod enroll;
pub mod error;
pub mod plagiarism;
pub mod process;
pub mod projects;
pub mod reconcile;
pub mod report;

pub use course::CourseLayout;
pub use error::{ProcessError, ProvisionError, ReconcileError};
pub use process::{CommandRunner, SystemRunner};
pub use reconcile::{reconcile, Lookup, Reconcilable, Reconciled, ResourceKind};
pub use report::{BatchEntry, BatchReport};
