/// Request identity for gallery-service
///
/// Authentication happens upstream. The gateway forwards the caller's opaque
/// user id in `X-User-Id`; handlers that need it take a `CurrentUser`, and
/// handlers where it is optional take `Option<CurrentUser>`.
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let user = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| CurrentUser(value.to_string()))
            .ok_or_else(|| AppError::Unauthorized(format!("{} header missing", USER_ID_HEADER)));

        ready(user)
    }
}
