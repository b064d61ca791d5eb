//! One-shot messages carried across a redirect.
//!
//! A mutating endpoint answers `303 See Other`: to the page it forwards to
//! when the service call succeeded, or back to where the user came from when
//! it failed. Either way the message rides along in the `flash` cookie, and
//! the next GET page hands it out once and clears it.

use axum::extract::rejection::FormRejection;
use axum::http::{header::REFERER, HeaderMap};
use axum::response::Redirect;
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::Outcome;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Failure,
            message: message.into(),
        }
    }

    /// Cookie-safe encoding: hex of the JSON form.
    pub fn encode(&self) -> String {
        hex::encode(serde_json::to_vec(self).unwrap_or_default())
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = hex::decode(raw).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// What a GET page renders: the pending flash message, if any, and the
/// page's view model.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
    pub response: T,
}

/// Pull the pending flash message out of the jar, clearing the cookie.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let flash = jar
        .get(FLASH_COOKIE)
        .and_then(|cookie| Flash::decode(cookie.value()));
    match flash {
        Some(flash) => (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), Some(flash)),
        None => (jar, None),
    }
}

pub fn page<T>(jar: CookieJar, response: T) -> (CookieJar, Page<T>) {
    let (jar, flash) = take_flash(jar);
    (jar, Page { flash, response })
}

/// Unwrap a posted form. A body that cannot be read is a validation failure
/// like any other, so it goes back to the page with a message.
pub fn read_form<T>(form: Result<Form<T>, FormRejection>) -> AppResult<T> {
    match form {
        Ok(Form(body)) => Ok(body),
        Err(rejection) => {
            tracing::info!(error = %rejection.body_text(), "Unreadable form body");
            Err(AppError::Validation(
                "Please check the form and try again".into(),
            ))
        }
    }
}

/// Path part of a `Referer` value. Absolute URLs are cut down to their path
/// so a redirect never leaves this host.
pub fn referer_path(referer: &str) -> Option<&str> {
    let referer = referer.trim();
    let path = if referer.starts_with('/') {
        referer
    } else {
        let (_, rest) = referer.split_once("://")?;
        &rest[rest.find('/')?..]
    };
    // Browsers read "//host" and "/\host" as another origin
    if path.starts_with("//") || path.starts_with("/\\") {
        return None;
    }
    Some(path)
}

/// Where a mutating endpoint sends the user: `forward` on success, otherwise
/// back to the referring page, or `fallback` when there is no usable referer.
pub fn redirect_target<'a>(
    succeeded: bool,
    forward: &'a str,
    referer: Option<&'a str>,
    fallback: &'a str,
) -> &'a str {
    if succeeded {
        forward
    } else {
        referer.and_then(referer_path).unwrap_or(fallback)
    }
}

/// Answer a mutating request from its service result.
///
/// Domain failures become a back-redirect carrying the failure message.
/// Infrastructure failures are not the user's to fix and propagate as an
/// error response.
pub fn flash_redirect<T>(
    jar: CookieJar,
    headers: &HeaderMap,
    result: AppResult<Outcome<T>>,
    forward: &str,
    fallback: &str,
) -> AppResult<(CookieJar, Redirect)> {
    let referer = headers.get(REFERER).and_then(|v| v.to_str().ok());

    let (flash, target) = match result {
        Ok(outcome) => (
            Flash::success(outcome.message),
            redirect_target(true, forward, referer, fallback),
        ),
        Err(e) if e.is_domain_failure() => {
            tracing::info!(error = %e, "Request rejected, redirecting back");
            (
                Flash::failure(e.user_message()),
                redirect_target(false, forward, referer, fallback),
            )
        }
        Err(e) => return Err(e),
    };

    let cookie = Cookie::build((FLASH_COOKIE, flash.encode()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Redirect::to(target)))
}
