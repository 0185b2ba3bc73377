//! Admin capability gate for team management routes.
//!
//! Team creation and deletion are guarded by a static shared secret
//! presented in a request header. Handlers opt in by taking an
//! [`AdminKey`] extractor argument; extraction fails with Forbidden when
//! the header is absent or wrong.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use tracing::warn;

use crate::domain::Error;

/// Header carrying the shared admin secret.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Configured shared secret, injected as app data.
#[derive(Clone)]
pub struct AdminGate {
    key: Arc<str>,
}

impl AdminGate {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().into(),
        }
    }

    fn matches(&self, presented: &str) -> bool {
        *self.key == *presented
    }
}

/// Proof that the request carried the admin secret.
pub struct AdminKey;

impl FromRequest for AdminKey {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorise(req))
    }
}

fn authorise(req: &HttpRequest) -> Result<AdminKey, Error> {
    let Some(gate) = req.app_data::<web::Data<AdminGate>>() else {
        warn!("admin gate missing from app data");
        return Err(Error::internal("admin gate not configured"));
    };
    let presented = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    match presented {
        Some(key) if gate.matches(key) => Ok(AdminKey),
        _ => Err(Error::forbidden("admin access required")),
    }
}
