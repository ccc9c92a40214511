//! Extractors that turn missing or malformed request fields into a 400.

use axum::Json;
use axum::extract::{Form, FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AgencyError;

/// `application/x-www-form-urlencoded` body where every declared field is required.
pub struct RequiredForm<T>(pub T);

impl<T, S> FromRequest<S> for RequiredForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AgencyError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(Self(value)),
            Err(rejection) => Err(AgencyError::bad_request(rejection.body_text())),
        }
    }
}

pub struct RequiredQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for RequiredQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AgencyError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(AgencyError::bad_request(rejection.body_text())),
        }
    }
}

/// Path parameters; a segment that does not parse is a 400 with the usual error body.
pub struct RequiredPath<T>(pub T);

impl<T, S> FromRequestParts<S> for RequiredPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AgencyError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(AgencyError::bad_request(rejection.body_text())),
        }
    }
}

pub struct RequiredJson<T>(pub T);

impl<T, S> FromRequest<S> for RequiredJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AgencyError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AgencyError::bad_request(rejection.body_text())),
        }
    }
}
