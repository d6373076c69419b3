//! Request handlers.

use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use log::debug;

use crate::engine::token::TOKEN_FIELD;
use crate::engine::{Action, RenderOutcome, Submission, SubmitOutcome};
use crate::utils::validation::{InputMode, RawInput, RawValue};

use super::cookie::SessionCookie;
use super::error::WebError;
use super::state::WebState;

const SUBMIT_NEXT: &str = "submitNext";
const SUBMIT_COMPLETE: &str = "submitComplete";
const SUBMIT_BACK: &str = "submitBack";
const SUBMIT_RESET: &str = "submitReset";

pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

pub(crate) fn page_redirect(step: usize) -> Response {
    found(&format!("/page/{}", step))
}

fn with_cookie(cookie: &SessionCookie, mut response: Response) -> Response {
    cookie.apply(response.headers_mut());
    response
}

/// `GET /` sends the browser to the session's current step.
pub async fn index(
    State(state): State<WebState>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let cookie = SessionCookie::from_headers(&headers);
    let step = state.engine.current_step(&cookie.id)?;
    Ok(with_cookie(&cookie, page_redirect(step)))
}

/// `GET /page/:page`
pub async fn show_page(
    State(state): State<WebState>,
    Path(page): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    if !state.patterns.matches("num", &page) {
        return Err(WebError::NotFound);
    }
    let requested: usize = page.parse().map_err(|_| WebError::NotFound)?;

    let cookie = SessionCookie::from_headers(&headers);
    let response = match state.engine.render_step(&cookie.id, requested)? {
        RenderOutcome::Page(page) => Html(state.renderer.render(&page)?).into_response(),
        RenderOutcome::Redirect(step) => page_redirect(step),
    };
    Ok(with_cookie(&cookie, response))
}

/// `POST /page/submit`
pub async fn submit(
    State(state): State<WebState>,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, WebError> {
    let cookie = SessionCookie::from_headers(&headers);
    let form = SubmittedForm::from_pairs(pairs);

    let Some(action) = form.action else {
        debug!("Form posted without an action; returning to current step");
        let step = state.engine.current_step(&cookie.id)?;
        return Ok(with_cookie(&cookie, page_redirect(step)));
    };

    let submission = Submission {
        action,
        input: form.input,
        mode: InputMode::Structured,
        token: form.token,
    };
    let response = match state.engine.submit(&cookie.id, submission)? {
        SubmitOutcome::Redirect(step) => page_redirect(step),
        SubmitOutcome::Reset => found("/"),
        SubmitOutcome::Completed(step) => match &state.completion_url {
            Some(url) => found(url),
            None => page_redirect(step),
        },
    };
    Ok(with_cookie(&cookie, response))
}

pub async fn not_found() -> WebError {
    WebError::NotFound
}

/// A posted form split into the action flag, the anti-forgery token, and field input.
#[derive(Debug, Default)]
struct SubmittedForm {
    action: Option<Action>,
    token: Option<String>,
    input: RawInput,
}

impl SubmittedForm {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        let mut flags = Vec::new();
        for (key, value) in pairs {
            match key.as_str() {
                SUBMIT_NEXT | SUBMIT_COMPLETE | SUBMIT_BACK | SUBMIT_RESET => flags.push(key),
                TOKEN_FIELD => form.token = Some(value),
                _ => {
                    form.input.insert(key, RawValue::Text(value));
                }
            }
        }
        let has = |name: &str| flags.iter().any(|f| f == name);
        form.action = if has(SUBMIT_COMPLETE) {
            Some(Action::Complete)
        } else if has(SUBMIT_NEXT) {
            Some(Action::Next)
        } else if has(SUBMIT_BACK) {
            Some(Action::Back)
        } else if has(SUBMIT_RESET) {
            Some(Action::Reset)
        } else {
            None
        };
        form
    }
}
