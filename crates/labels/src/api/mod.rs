//! Remote label service client.
//!
//! Thin wrapper over the hosting service's REST label endpoints: a paged
//! list plus create (POST), update (PATCH keyed by the original name) and
//! delete (DELETE keyed by the current name).

mod client;
mod models;

pub use client::{LabelApiError, LabelClient};
pub use models::{Label, LabelPayload, ParseRepoIdError, RepoId};
