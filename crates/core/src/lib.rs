//! Core business logic for certvault.
//!
//! Services take their collaborators at construction: a database handle,
//! a [`KeyCustody`] for encrypted key material and a [`PermissionChecker`].
//! Every operation takes the calling [`ActorContext`].

pub mod services;

pub use services::*;
