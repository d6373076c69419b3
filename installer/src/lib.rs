// Install Wizard
// Main library entry point

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod session;
pub mod steps;
pub mod tui;
pub mod utils;
pub mod web;

use anyhow::{Context, Result};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use config::{LoggingSettings, SessionBackend, Settings};
use engine::StepFlowEngine;
use session::{FileSessionStore, MemorySessionStore, SessionStore};
use steps::{ControllerRegistry, StepCatalog};

/// Initialize logging system with dual format (JSON + human-readable)
pub fn init_logging(settings: &LoggingSettings, with_stdout: bool) -> Result<PathBuf> {
    let log_dir = utils::path_resolver::resolve_log_folder(settings.dir.as_deref())?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");

    // JSON log file for structured parsing
    let json_log_file = log_dir.join(format!("wizard-{}.log", timestamp));

    // Human-readable log file (.txt)
    let txt_log_file = log_dir.join(format!("wizard-{}.txt", timestamp));

    // Configure dual-format logging:
    // - JSON format to .log file
    // - Human-readable format to .txt file
    // - Optional: human-readable to stdout (disabled in terminal mode, stdout carries the prompts)
    let mut dispatch = fern::Dispatch::new().level(settings.level_filter());

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", txt_line));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply().context("Logger already initialized")?;

    log::info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(log_dir)
}

/// Session store selected by configuration.
pub fn build_session_store(settings: &Settings) -> Result<Arc<dyn SessionStore>> {
    match settings.session.backend {
        SessionBackend::Memory => Ok(Arc::new(MemorySessionStore::with_idle_limit(
            settings.session_timeout(),
        ))),
        SessionBackend::File => {
            let dir =
                utils::path_resolver::resolve_session_folder(settings.session.dir.as_deref())?;
            info!(
                "[PHASE: initialization] [STEP: session_store] File sessions in {:?}",
                dir
            );
            Ok(Arc::new(FileSessionStore::new(dir)?))
        }
    }
}

/// Registry + store + timeout, wired from settings.
pub fn build_engine(settings: &Settings) -> Result<StepFlowEngine> {
    let catalog = StepCatalog::builtin(&settings.wizard);
    let registry =
        ControllerRegistry::from_names(&settings.wizard.steps, &catalog, settings.wizard.max_steps)?;
    let store = build_session_store(settings)?;
    Ok(StepFlowEngine::new(
        registry,
        store,
        settings.session_timeout(),
    ))
}

fn start(settings: &Settings, with_stdout: bool, mode: &str) {
    if let Err(e) = init_logging(&settings.logging, with_stdout) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    info!(
        "[PHASE: initialization] Install wizard ({}) starting at {}",
        mode,
        chrono::Utc::now()
    );
    if let Ok(folder) = utils::path_resolver::resolve_deployment_folder() {
        info!(
            "[PHASE: initialization] [STEP: deployment_folder] Deployment folder: {:?}",
            folder
        );
    }
}

fn fail(phase: &str, e: &anyhow::Error) -> ExitCode {
    error!("[PHASE: {}] [STEP: fatal] {:#}", phase, e);
    eprintln!("\n[CRITICAL ERROR] {:#}", e);
    eprintln!("Installation failed. Please try again.");
    ExitCode::FAILURE
}

/// Interactive terminal installation. Exit 0 on completion, 1 on any fatal fault.
pub fn run_cli(settings: &Settings) -> ExitCode {
    // No stdout logging: the terminal belongs to the prompts
    start(settings, false, "terminal");

    let engine = match build_engine(settings) {
        Ok(engine) => engine,
        Err(e) => return fail("cli", &e),
    };
    let mut driver = cli::TerminalDriver::new(&engine, cli::StdioPrompter::new());
    match driver.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail("cli", &e),
    }
}

/// Serve the wizard over HTTP until interrupted.
pub fn run_web(settings: &Settings) -> ExitCode {
    start(settings, true, "web");

    let result = (|| -> Result<()> {
        let engine = Arc::new(build_engine(settings)?);
        let state = web::WebState::new(engine, settings.web.completion_url.clone())?;
        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        runtime.block_on(web::serve(state, &settings.web.bind))
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail("web", &e),
    }
}

/// Non-interactive single-frame render of one step (for automated checks).
pub fn run_tui_smoke(settings: &Settings, step: usize) -> ExitCode {
    // Initialize logging (no stdout to avoid corrupting the terminal)
    start(settings, false, "tui-smoke");

    let result = build_engine(settings).and_then(|engine| tui::smoke(&engine, step));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail("tui", &e),
    }
}
