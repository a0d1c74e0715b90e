use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

/// `axum::Json` whose rejection (bad syntax, missing field, value outside an
/// option set) is answered as a 400 in the usual error body.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Query` with the same rejection handling as [`JsonBody`].
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);
