//! Request extractors whose rejections use the API's JSON error envelope.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json`, but malformed bodies answer with [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);
