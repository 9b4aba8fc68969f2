//! Conversions from handler return values into HTTP responses.
//!
//! The [`Responder`] trait lets application handlers and middleware return plain values
//! (`&'static str`, `String`, a status code, a [`Json`] payload, ...) instead of building
//! a [`Response`] by hand.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use lightmux_http::body::ResponseBody;
use mime::Mime;
use serde::Serialize;
use tracing::error;

/// A trait for types that can be converted into HTTP responses.
pub trait Responder {
    fn into_response(self) -> Response<ResponseBody>;
}

/// Pre-built responses pass through untouched.
impl Responder for Response<ResponseBody> {
    fn into_response(self) -> Response<ResponseBody> {
        self
    }
}

/// Either variant is turned into a response, so `Err` can carry an error page.
impl<T: Responder, E: Responder> Responder for Result<T, E> {
    fn into_response(self) -> Response<ResponseBody> {
        match self {
            Ok(t) => t.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn into_response(self) -> Response<ResponseBody> {
        let (status, responder) = self;
        let mut response = responder.into_response();
        *response.status_mut() = status;
        response
    }
}

impl Responder for StatusCode {
    fn into_response(self) -> Response<ResponseBody> {
        let mut response = Response::new(ResponseBody::empty());
        *response.status_mut() = self;
        response
    }
}

impl Responder for () {
    fn into_response(self) -> Response<ResponseBody> {
        Response::new(ResponseBody::empty())
    }
}

impl Responder for &'static str {
    fn into_response(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), &mime::TEXT_PLAIN_UTF_8)
    }
}

impl Responder for String {
    fn into_response(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), &mime::TEXT_PLAIN_UTF_8)
    }
}

impl Responder for Bytes {
    fn into_response(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), &mime::APPLICATION_OCTET_STREAM)
    }
}

/// Serializes the wrapped value as an `application/json` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T: Serialize> Responder for Json<T> {
    fn into_response(self) -> Response<ResponseBody> {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => with_content_type(ResponseBody::from(Bytes::from(bytes)), &mime::APPLICATION_JSON),
            Err(e) => {
                error!(cause = %e, "serialize json response error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub(crate) fn with_content_type(body: ResponseBody, mime: &Mime) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
