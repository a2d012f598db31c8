use std::sync::Arc;

use crate::db::repository::Repository;

pub mod approval;
pub mod diff;
pub mod effects;
pub mod policy;
pub mod submission;
pub mod validation;

/// Entry point for every change-request operation, manager- and admin-facing.
///
/// Submission and revision live in [`submission`]; approval, rejection,
/// cancellation and the admin views live in [`approval`].
#[derive(Clone)]
pub struct RequestService {
    repo: Arc<dyn Repository>,
}

impl RequestService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }
}
