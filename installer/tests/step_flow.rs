// Step flow behaviour through the public API

use std::sync::Arc;

use chrono::{Duration, Utc};
use install_wizard::config::WizardSettings;
use install_wizard::engine::{
    Action, RenderOutcome, StepFlowEngine, StepPage, Submission, SubmitOutcome,
};
use install_wizard::models::{Feedback, FieldDescriptor, FieldValue, FieldValues};
use install_wizard::session::{FileSessionStore, MemorySessionStore, SessionStore};
use install_wizard::steps::registry::MAX_STEPS;
use install_wizard::steps::{ControllerRegistry, StepCatalog, StepController, StepFactory};
use install_wizard::utils::validation::{InputMode, RawInput, RawValue};

const SID: &str = "integration-session";

fn builtin_engine(store: Arc<dyn SessionStore>) -> StepFlowEngine {
    let settings = WizardSettings::default();
    let catalog = StepCatalog::builtin(&settings);
    let registry = ControllerRegistry::from_names(&settings.steps, &catalog, MAX_STEPS)
        .expect("builtin steps resolve");
    StepFlowEngine::new(registry, store, Duration::seconds(1800))
}

fn page(engine: &StepFlowEngine, step: usize) -> StepPage {
    match engine.render_step(SID, step).expect("render") {
        RenderOutcome::Page(page) => page,
        RenderOutcome::Redirect(n) => panic!("expected page {}, redirected to {}", step, n),
    }
}

fn form(action: Action, token: &str, fields: &[(&str, &str)]) -> Submission {
    let input: RawInput = fields
        .iter()
        .map(|(k, v)| (k.to_string(), RawValue::Text(v.to_string())))
        .collect();
    Submission {
        action,
        input,
        mode: InputMode::Structured,
        token: Some(token.to_string()),
    }
}

const VALID_DB: [(&str, &str); 5] = [
    ("db_host", "db.internal"),
    ("db_name", "wizard"),
    ("db_user", "admin"),
    ("accept_terms", "yes"),
    ("engine", "mysql"),
];

fn assert_step_in_range(store: &dyn SessionStore, total: usize) {
    if let Some(state) = store.get(SID).unwrap() {
        assert!(
            (1..=total).contains(&state.current_step),
            "current step {} outside 1..={}",
            state.current_step,
            total
        );
    }
}

#[test]
fn full_walk_keeps_step_in_range_and_saves_sanitized_values() {
    let store = Arc::new(MemorySessionStore::new());
    let engine = builtin_engine(store.clone());
    let total = engine.total_steps();
    assert_eq!(total, 3);

    let p1 = page(&engine, 1);
    assert_eq!(p1.step_id, "welcome");
    assert_step_in_range(store.as_ref(), total);
    let out = engine
        .submit(SID, form(Action::Next, &p1.token, &[("instance_name", "<demo>")]))
        .unwrap();
    assert_eq!(out, SubmitOutcome::Redirect(2));
    assert_step_in_range(store.as_ref(), total);

    let p2 = page(&engine, 2);
    assert_eq!(p2.task_name, "Database Setup");
    let state = store.get(SID).unwrap().unwrap();
    assert_eq!(state.current_step, 2);
    let welcome = state.saved_for("welcome").unwrap();
    assert_eq!(
        welcome.get("instance_name"),
        Some(&FieldValue::text("&lt;demo&gt;"))
    );
    assert_eq!(welcome.get("send_usage"), Some(&FieldValue::Bool(false)));
    assert!(!welcome.contains_key("csrf_token"));

    let out = engine
        .submit(SID, form(Action::Next, &p2.token, &VALID_DB))
        .unwrap();
    assert_eq!(out, SubmitOutcome::Redirect(3));
    let p3 = page(&engine, 3);
    assert!(p3.navigation.show_complete);
    assert!(!p3.navigation.show_next);

    let out = engine
        .submit(SID, form(Action::Complete, &p3.token, &[]))
        .unwrap();
    assert_eq!(out, SubmitOutcome::Completed(3));
    assert_step_in_range(store.as_ref(), total);
}

#[test]
fn requesting_another_step_redirects_without_mutation() {
    let store = Arc::new(MemorySessionStore::new());
    let engine = builtin_engine(store.clone());
    page(&engine, 1);
    let before = store.get(SID).unwrap().unwrap();

    for requested in [0, 2, 3, 99] {
        match engine.render_step(SID, requested).unwrap() {
            RenderOutcome::Redirect(n) => assert_eq!(n, 1, "requested {}", requested),
            RenderOutcome::Page(p) => panic!("step {} rendered for request {}", p.step, requested),
        }
        assert_eq!(store.get(SID).unwrap().unwrap(), before);
    }
}

#[test]
fn empty_db_host_is_a_domain_rejection_not_a_fault() {
    let store = Arc::new(MemorySessionStore::new());
    let engine = builtin_engine(store.clone());
    let p1 = page(&engine, 1);
    engine.submit(SID, form(Action::Next, &p1.token, &[])).unwrap();
    let p2 = page(&engine, 2);

    let mut fields = VALID_DB.to_vec();
    fields[0] = ("db_host", "");
    let out = engine
        .submit(SID, form(Action::Next, &p2.token, &fields))
        .expect("rejection must not be an error");
    assert_eq!(out, SubmitOutcome::Redirect(2));

    let state = store.get(SID).unwrap().unwrap();
    assert_eq!(state.current_step, 2);
    assert!(state.saved_for("database").is_none());

    let again = page(&engine, 2);
    assert_eq!(
        again.feedback.map(|f| f.message).as_deref(),
        Some("Database host is required.")
    );
}

#[test]
fn back_navigation_preserves_forward_filled_data() {
    let store = Arc::new(MemorySessionStore::new());
    let engine = builtin_engine(store.clone());
    let p1 = page(&engine, 1);
    engine
        .submit(
            SID,
            form(Action::Next, &p1.token, &[("instance_name", "prod"), ("edition", "2")]),
        )
        .unwrap();
    let p2 = page(&engine, 2);
    engine
        .submit(SID, form(Action::Next, &p2.token, &VALID_DB))
        .unwrap();
    let p3 = page(&engine, 3);

    assert_eq!(
        engine.submit(SID, form(Action::Back, &p3.token, &[])).unwrap(),
        SubmitOutcome::Redirect(2)
    );
    let back_on_2 = page(&engine, 2);
    let host = back_on_2.fields.iter().find(|f| f.key == "db_host").unwrap();
    assert_eq!(host.value, FieldValue::text("db.internal"));
    let engine_field = back_on_2.fields.iter().find(|f| f.key == "engine").unwrap();
    assert_eq!(engine_field.value, FieldValue::text("mysql"));

    assert_eq!(
        engine
            .submit(SID, form(Action::Back, &back_on_2.token, &[("db_name", "edited")]))
            .unwrap(),
        SubmitOutcome::Redirect(1)
    );
    let back_on_1 = page(&engine, 1);
    let edition = back_on_1.fields.iter().find(|f| f.key == "edition").unwrap();
    assert_eq!(edition.value, FieldValue::text("professional"));

    let state = store.get(SID).unwrap().unwrap();
    let db = state.saved_for("database").unwrap();
    assert_eq!(db.get("db_name"), Some(&FieldValue::text("edited")), "back merges");
    assert_eq!(db.get("db_host"), Some(&FieldValue::text("db.internal")));
}

fn walk_to_step_two(engine: &StepFlowEngine) -> StepPage {
    let p1 = page(engine, 1);
    engine.submit(SID, form(Action::Next, &p1.token, &[])).unwrap();
    page(engine, 2)
}

#[test]
fn blank_password_on_resubmit_keeps_saved_password() {
    let store = Arc::new(MemorySessionStore::new());
    let engine = builtin_engine(store.clone());
    let p2 = walk_to_step_two(&engine);

    let mut fields = VALID_DB.to_vec();
    fields.push(("db_password", "s3cret"));
    engine
        .submit(SID, form(Action::Next, &p2.token, &fields))
        .unwrap();
    let p3 = page(&engine, 3);
    engine
        .submit(SID, form(Action::Back, &p3.token, &[]))
        .unwrap();
    let again = page(&engine, 2);

    // A browser posts the password input back empty.
    let mut fields = VALID_DB.to_vec();
    fields.push(("db_password", ""));
    assert_eq!(
        engine
            .submit(SID, form(Action::Next, &again.token, &fields))
            .unwrap(),
        SubmitOutcome::Redirect(3)
    );

    let state = store.get(SID).unwrap().unwrap();
    let db = state.saved_for("database").unwrap();
    assert_eq!(db.get("db_password"), Some(&FieldValue::text("s3cret")));
}

#[test]
fn back_keeps_values_that_would_fail_validation() {
    let store = Arc::new(MemorySessionStore::new());
    let engine = builtin_engine(store.clone());
    let p2 = walk_to_step_two(&engine);

    let out = engine
        .submit(
            SID,
            form(
                Action::Back,
                &p2.token,
                &[("db_host", "typed-host"), ("admin_email", "half@typed")],
            ),
        )
        .unwrap();
    assert_eq!(out, SubmitOutcome::Redirect(1));

    let state = store.get(SID).unwrap().unwrap();
    let db = state.saved_for("database").unwrap();
    assert_eq!(db.get("admin_email"), Some(&FieldValue::text("half@typed")));
    assert_eq!(db.get("db_host"), Some(&FieldValue::text("typed-host")));

    let p1 = page(&engine, 1);
    engine.submit(SID, form(Action::Next, &p1.token, &[])).unwrap();
    let p2 = page(&engine, 2);
    let email = p2.fields.iter().find(|f| f.key == "admin_email").unwrap();
    assert_eq!(email.value, FieldValue::text("half@typed"));
}

#[test]
fn reset_returns_to_initial_state_from_any_step() {
    let store = Arc::new(MemorySessionStore::new());
    let engine = builtin_engine(store.clone());
    let p1 = page(&engine, 1);
    engine.submit(SID, form(Action::Next, &p1.token, &[])).unwrap();
    let p2 = page(&engine, 2);

    assert_eq!(
        engine.submit(SID, form(Action::Reset, &p2.token, &[])).unwrap(),
        SubmitOutcome::Reset
    );
    assert!(store.get(SID).unwrap().is_none());
    assert_eq!(engine.current_step(SID).unwrap(), 1);

    let fresh = page(&engine, 1);
    assert_ne!(fresh.token, p2.token);
    let state = store.get(SID).unwrap().unwrap();
    assert_eq!(state.current_step, 1);
    assert!(state.saved_values.is_empty());
}

#[test]
fn token_mismatch_feedback_is_shown_exactly_once() {
    let store = Arc::new(MemorySessionStore::new());
    let engine = builtin_engine(store.clone());
    page(&engine, 1);

    let mut missing = form(Action::Next, "", &[]);
    missing.token = None;
    assert_eq!(engine.submit(SID, missing).unwrap(), SubmitOutcome::Redirect(1));

    let first = page(&engine, 1);
    assert!(first.feedback.is_some_and(|f| f.is_error()));
    assert!(page(&engine, 1).feedback.is_none());
}

#[test]
fn idle_session_is_destroyed_and_restarted() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSessionStore::new(dir.path()).unwrap());
    let engine = builtin_engine(store.clone());
    let p1 = page(&engine, 1);
    engine.submit(SID, form(Action::Next, &p1.token, &[])).unwrap();
    page(&engine, 2);

    let mut state = store.get(SID).unwrap().unwrap();
    state.last_activity_at = Utc::now() - Duration::seconds(1801);
    store.put(SID, &state).unwrap();

    match engine.render_step(SID, 2).unwrap() {
        RenderOutcome::Redirect(n) => assert_eq!(n, 1),
        RenderOutcome::Page(_) => panic!("expired session must not render"),
    }
    assert!(store.get(SID).unwrap().is_none());
    assert_eq!(page(&engine, 1).step, 1);
}

#[test]
fn corrupt_session_blob_restarts_at_step_one() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSessionStore::new(dir.path()).unwrap());
    let engine = builtin_engine(store.clone());
    std::fs::write(
        dir.path().join(format!("install_wizard.{}.json", SID)),
        b"not json at all",
    )
    .unwrap();

    assert_eq!(page(&engine, 1).step, 1);
    assert_eq!(store.get(SID).unwrap().unwrap().current_step, 1);
}

struct Ranked {
    id: &'static str,
    priority: i32,
}

impl StepController for Ranked {
    fn id(&self) -> &str {
        self.id
    }
    fn priority(&self) -> i32 {
        self.priority
    }
    fn task_name(&self) -> String {
        format!("Priority {}", self.priority)
    }
    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::text(self.id, self.id, "")]
    }
    fn advance(&self, _input: &FieldValues) -> anyhow::Result<Option<Feedback>> {
        Ok(None)
    }
}

fn ranked(id: &'static str, priority: i32) -> (String, StepFactory) {
    (
        id.to_string(),
        Arc::new(move || Box::new(Ranked { id, priority }) as Box<dyn StepController>),
    )
}

#[test]
fn registry_orders_by_priority_and_first_page_shows_lowest() {
    let registry = ControllerRegistry::from_factories(
        vec![ranked("b", 2), ranked("a", 1), ranked("z", 99)],
        MAX_STEPS,
    )
    .unwrap();
    assert_eq!(registry.names(), vec!["a", "b", "z"]);

    let engine = StepFlowEngine::new(
        registry,
        Arc::new(MemorySessionStore::new()),
        Duration::seconds(1800),
    );
    let first = page(&engine, 1);
    assert_eq!(first.task_name, "Priority 1");
    assert_eq!(first.fields[0].key, "a");
}

#[test]
fn registry_misconfiguration_is_fatal() {
    let err = ControllerRegistry::from_factories(Vec::new(), MAX_STEPS).unwrap_err();
    assert!(err.is_fatal());

    let too_many: Vec<_> = (0..=MAX_STEPS).map(|i| ranked("x", i as i32)).collect();
    assert!(ControllerRegistry::from_factories(too_many, MAX_STEPS).is_err());

    let catalog = StepCatalog::builtin(&WizardSettings::default());
    let err = ControllerRegistry::from_names(&["nope".to_string()], &catalog, MAX_STEPS)
        .unwrap_err();
    assert!(err.is_fatal());
}
