//! Step flow engine.
//!
//! Tracks which step is active for a session, enforces the legal transitions
//! (forward / back / reset), keeps every step's validated values, and mediates between a
//! front-end driver and the active step controller.
//!
//! Transitions are two-phase: a successful submit only *arms* the navigation guard with
//! the one step the user may go to next; the following render commits it. Any other
//! requested step is redirected to the current one without touching state, which is what
//! stops users from jumping ahead by editing a URL or replaying a step number.

use chrono::{Duration, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::{ProtocolViolation, StoreError, WizardError};
use crate::models::field::{merge_saved_values, validate_fields};
use crate::models::{Feedback, FieldDescriptor, SessionState};
use crate::session::SessionStore;
use crate::steps::{ControllerRegistry, StepController};
use crate::utils::logging::mask_sensitive;
use crate::utils::validation::{resolve_retreat, resolve_submission, InputMode, RawInput};

pub mod sanitize;
pub mod token;

use sanitize::sanitize_values;
use token::{mint_token, verify_token};

/// Idle time after which a session is discarded.
pub const DEFAULT_SESSION_TIMEOUT_SECS: i64 = 1800;

pub const INVALID_SUBMISSION: &str = "Invalid form submission. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationFlags {
    pub show_back: bool,
    pub show_next: bool,
    pub show_complete: bool,
}

impl NavigationFlags {
    pub fn for_step(step: usize, total: usize) -> Self {
        let show_next = step < total;
        Self {
            show_back: step > 1,
            show_next,
            show_complete: !show_next,
        }
    }
}

/// Everything a front-end needs to draw one step.
#[derive(Debug, Clone)]
pub struct StepPage {
    pub step: usize,
    pub total_steps: usize,
    pub step_id: String,
    pub task_name: String,
    pub fields: Vec<FieldDescriptor>,
    pub navigation: NavigationFlags,
    /// One-shot: taken out of the session by this render.
    pub feedback: Option<Feedback>,
    pub token: String,
}

#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Page(StepPage),
    /// The requested step may not be shown; render this one instead.
    Redirect(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Complete,
    Back,
    Reset,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Next => "next",
            Action::Complete => "complete",
            Action::Back => "back",
            Action::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub action: Action,
    pub input: RawInput,
    pub mode: InputMode,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Render this step next (the current one on rejection, the armed one on success).
    Redirect(usize),
    /// `complete` was accepted on the last step.
    Completed(usize),
    /// The session was torn down; start again at step 1.
    Reset,
}

pub struct StepFlowEngine {
    registry: ControllerRegistry,
    store: Arc<dyn SessionStore>,
    session_timeout: Duration,
}

impl StepFlowEngine {
    pub fn new(
        registry: ControllerRegistry,
        store: Arc<dyn SessionStore>,
        session_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            session_timeout,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    /// The step a session should be looking at (1 for unknown or unreadable sessions).
    pub fn current_step(&self, session_id: &str) -> Result<usize, WizardError> {
        let step = self
            .load_for_render(session_id)?
            .map_or(1, |s| s.current_step);
        Ok(step.clamp(1, self.total_steps()))
    }

    /// Drop all state for a session.
    pub fn destroy(&self, session_id: &str) -> Result<(), WizardError> {
        self.store.delete(session_id)?;
        Ok(())
    }

    pub fn render_step(
        &self,
        session_id: &str,
        requested: usize,
    ) -> Result<RenderOutcome, WizardError> {
        let now = Utc::now();
        let total = self.total_steps();

        let (mut state, step) = match self.load_for_render(session_id)? {
            None if requested != 1 => return Ok(RenderOutcome::Redirect(1)),
            None => {
                info!(
                    "[PHASE: flow] [STEP: render] New session {}",
                    mask_sensitive(session_id)
                );
                (SessionState::new(now), 1)
            }
            Some(mut state) => {
                if state.is_expired(now, self.session_timeout) {
                    info!(
                        "[PHASE: flow] [STEP: render] Session {} expired; restarting",
                        mask_sensitive(session_id)
                    );
                    self.store.delete(session_id)?;
                    return Ok(RenderOutcome::Redirect(1));
                }

                if state.current_step == 0 || state.current_step > total {
                    let repaired = state.current_step.clamp(1, total);
                    warn!(
                        "[PHASE: flow] [STEP: render] Stored step {} outside 1..={}; repairing to {}",
                        state.current_step, total, repaired
                    );
                    state.current_step = repaired;
                    state.reset_navigation();
                    self.store.put(session_id, &state)?;
                    return Ok(RenderOutcome::Redirect(repaired));
                }

                if state.navigation_allowed {
                    if state.allowed_next_step != Some(requested) {
                        debug!(
                            "Requested step {} but only {:?} is allowed",
                            requested, state.allowed_next_step
                        );
                        return Ok(RenderOutcome::Redirect(state.current_step));
                    }
                } else if requested != state.current_step {
                    debug!(
                        "Requested step {} without navigation; current is {}",
                        requested, state.current_step
                    );
                    return Ok(RenderOutcome::Redirect(state.current_step));
                }
                (state, requested)
            }
        };

        if step < 1 {
            return Ok(RenderOutcome::Redirect(1));
        }
        if step > total {
            return Ok(RenderOutcome::Redirect(total));
        }

        state.current_step = step;
        state.reset_navigation();

        let controller = self.controller_at(step)?;
        if let Err(e) = controller.initialize() {
            warn!(
                "[PHASE: flow] [STEP: render] initialize() failed for '{}': {:#}",
                controller.id(),
                e
            );
        }
        let fields = self.step_fields(controller.as_ref(), &state)?;

        let token = mint_token()?;
        state.anti_forgery_token = Some(token.clone());
        let feedback = state.pending_feedback.take();
        self.store.put(session_id, &state)?;

        info!(
            "[PHASE: flow] [STEP: render] Rendering step {}/{} '{}'",
            step,
            total,
            controller.id()
        );

        Ok(RenderOutcome::Page(StepPage {
            step,
            total_steps: total,
            step_id: controller.id().to_string(),
            task_name: controller.task_name(),
            fields,
            navigation: NavigationFlags::for_step(step, total),
            feedback,
            token,
        }))
    }

    pub fn submit(
        &self,
        session_id: &str,
        submission: Submission,
    ) -> Result<SubmitOutcome, WizardError> {
        let now = Utc::now();
        let total = self.total_steps();

        let mut state = match self.store.get(session_id) {
            Ok(Some(state)) => state,
            Ok(None) => SessionState::new(now),
            Err(StoreError::Corrupt { reason, .. }) => {
                warn!(
                    "[PHASE: flow] [STEP: submit] Discarding corrupt session {}: {}",
                    mask_sensitive(session_id),
                    reason
                );
                SessionState::new(now)
            }
            Err(e) => return Err(e.into()),
        };

        if state.is_expired(now, self.session_timeout) {
            info!(
                "[PHASE: flow] [STEP: submit] Session {} expired; restarting",
                mask_sensitive(session_id)
            );
            self.store.delete(session_id)?;
            return Ok(SubmitOutcome::Redirect(1));
        }

        state.pending_feedback = None;

        if !verify_token(
            state.anti_forgery_token.as_deref(),
            submission.token.as_deref(),
        ) {
            warn!(
                "[PHASE: flow] [STEP: submit] Anti-forgery token mismatch on step {} (action={})",
                state.current_step,
                submission.action.as_str()
            );
            state.pending_feedback = Some(Feedback::error(INVALID_SUBMISSION));
            self.store.put(session_id, &state)?;
            return Ok(SubmitOutcome::Redirect(state.current_step));
        }

        let step = state.current_step;
        info!(
            "[PHASE: flow] [STEP: submit] action={} on step {}/{}",
            submission.action.as_str(),
            step,
            total
        );

        match submission.action {
            Action::Reset => {
                self.registry.reset_all()?;
                self.store.delete(session_id)?;
                info!("[PHASE: flow] [STEP: submit] Session reset");
                Ok(SubmitOutcome::Reset)
            }
            Action::Back => {
                let controller = self.controller_at(step)?;
                let fields = self.step_fields(controller.as_ref(), &state)?;
                let resolution = resolve_retreat(&fields, &submission.input, submission.mode);
                if let Some(unchecked) = &resolution.rejection {
                    debug!("Keeping unvalidated values on back: {}", unchecked.message);
                }
                let values = sanitize_values(resolution.values, &resolution.supplied);
                state.merge_values(controller.id(), values.clone());

                if let Some(feedback) = controller
                    .retreat(&values)
                    .map_err(|source| hook_error(controller.as_ref(), source))?
                {
                    state.pending_feedback = Some(feedback);
                    self.store.put(session_id, &state)?;
                    return Ok(SubmitOutcome::Redirect(step));
                }

                let previous = step.saturating_sub(1).max(1);
                state.allow_navigation_to(previous);
                state.touch(now);
                self.store.put(session_id, &state)?;
                Ok(SubmitOutcome::Redirect(previous))
            }
            Action::Next | Action::Complete => {
                if submission.action == Action::Complete && step != total {
                    return Err(WizardError::Protocol {
                        violation: ProtocolViolation::CompleteOffLastStep {
                            current: step,
                            total,
                        },
                        current_step: step,
                    });
                }

                let controller = self.controller_at(step)?;
                let fields = self.step_fields(controller.as_ref(), &state)?;
                let resolution = resolve_submission(&fields, &submission.input, submission.mode);
                if let Some(feedback) = resolution.rejection {
                    state.pending_feedback = Some(feedback);
                    self.store.put(session_id, &state)?;
                    return Ok(SubmitOutcome::Redirect(step));
                }

                let values = sanitize_values(resolution.values, &resolution.supplied);
                if let Some(feedback) = controller
                    .advance(&values)
                    .map_err(|source| hook_error(controller.as_ref(), source))?
                {
                    debug!(
                        "Step '{}' rejected submission: {}",
                        controller.id(),
                        feedback.message
                    );
                    state.pending_feedback = Some(feedback);
                    self.store.put(session_id, &state)?;
                    return Ok(SubmitOutcome::Redirect(step));
                }

                state.replace_values(controller.id(), values);
                let target = match submission.action {
                    Action::Complete => step,
                    _ => (step + 1).min(total),
                };
                state.allow_navigation_to(target);
                state.touch(now);
                self.store.put(session_id, &state)?;

                if submission.action == Action::Complete {
                    Ok(SubmitOutcome::Completed(step))
                } else {
                    Ok(SubmitOutcome::Redirect(target))
                }
            }
        }
    }

    /// Build the page for `step` with default field values and no session. Used by the
    /// headless renderer; the returned token is empty and cannot be submitted.
    pub fn preview_step(&self, step: usize) -> Result<StepPage, WizardError> {
        let total = self.total_steps();
        let step = step.clamp(1, total.max(1));
        let controller = self.controller_at(step)?;
        let fields = controller.fields();
        validate_fields(&fields).map_err(|e| {
            WizardError::configuration(format!("step '{}': {}", controller.id(), e))
        })?;
        Ok(StepPage {
            step,
            total_steps: total,
            step_id: controller.id().to_string(),
            task_name: controller.task_name(),
            fields,
            navigation: NavigationFlags::for_step(step, total),
            feedback: None,
            token: String::new(),
        })
    }

    /// Load for a render: an unreadable blob counts as "no session" (restart at step 1),
    /// an unavailable store does not.
    fn load_for_render(&self, session_id: &str) -> Result<Option<SessionState>, WizardError> {
        match self.store.get(session_id) {
            Ok(state) => Ok(state),
            Err(StoreError::Corrupt { reason, .. }) => {
                warn!(
                    "[PHASE: flow] [STEP: render] Discarding corrupt session {}: {}",
                    mask_sensitive(session_id),
                    reason
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn controller_at(&self, step: usize) -> Result<Box<dyn StepController>, WizardError> {
        let total = self.total_steps();
        self.registry
            .instantiate(step)
            .ok_or(WizardError::Protocol {
                violation: ProtocolViolation::NoControllerAtStep { step, total },
                current_step: step.clamp(1, total.max(1)),
            })
    }

    /// Controller fields with the session's saved values overlaid.
    fn step_fields(
        &self,
        controller: &dyn StepController,
        state: &SessionState,
    ) -> Result<Vec<FieldDescriptor>, WizardError> {
        let mut fields = controller.fields();
        validate_fields(&fields).map_err(|e| {
            WizardError::configuration(format!("step '{}': {}", controller.id(), e))
        })?;
        merge_saved_values(&mut fields, state.saved_for(controller.id()));
        Ok(fields)
    }
}

fn hook_error(controller: &dyn StepController, source: anyhow::Error) -> WizardError {
    WizardError::Controller {
        step: controller.id().to_string(),
        source,
    }
}
