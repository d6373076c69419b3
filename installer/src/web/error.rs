//! Web error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};

use crate::error::WizardError;

use super::routes::page_redirect;

pub const NOT_FOUND_BODY: &str = "404 Not Found";

#[derive(Debug)]
pub enum WebError {
    NotFound,
    Wizard(WizardError),
    Internal(anyhow::Error),
}

impl From<WizardError> for WebError {
    fn from(err: WizardError) -> Self {
        WebError::Wizard(err)
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        WebError::Internal(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
            WebError::Wizard(err) => match err.redirect_step() {
                Some(step) if !err.is_fatal() => {
                    warn!("[PHASE: web] [STEP: submit] {}", err);
                    page_redirect(step)
                }
                _ => {
                    error!("[PHASE: web] [STEP: error] {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Installation error: {}", err),
                    )
                        .into_response()
                }
            },
            WebError::Internal(err) => {
                error!("[PHASE: web] [STEP: error] {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Installation error: {:#}", err),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProtocolViolation, StoreError};
    use axum::http::header::LOCATION;

    #[test]
    fn protocol_violation_redirects_to_current_step() {
        let resp = WebError::from(WizardError::Protocol {
            violation: ProtocolViolation::CompleteOffLastStep { current: 2, total: 3 },
            current_step: 2,
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/page/2");
    }

    #[test]
    fn faults_are_server_errors() {
        let resp = WebError::from(WizardError::Storage(StoreError::InvalidId("x y".into())))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let resp = WebError::from(WizardError::configuration("no steps")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_is_plain_404() {
        let resp = WebError::NotFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
