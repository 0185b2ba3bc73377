//! Shared HTTP adapter state.
//!
//! Handlers accept this via `actix_web::web::Data`, so they only depend on
//! the membership engine and remain testable over in-memory ports.

use std::sync::Arc;

use crate::domain::MembershipService;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub membership: Arc<MembershipService>,
}

impl HttpState {
    pub fn new(membership: Arc<MembershipService>) -> Self {
        Self { membership }
    }
}
