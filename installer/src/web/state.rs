//! Shared state for the web handlers.

use anyhow::Result;
use std::sync::Arc;

use crate::engine::StepFlowEngine;

use super::patterns::RoutePatterns;
use super::render::PageRenderer;

#[derive(Clone)]
pub struct WebState {
    pub engine: Arc<StepFlowEngine>,
    pub renderer: Arc<PageRenderer>,
    pub patterns: Arc<RoutePatterns>,
    /// Redirect target after `complete`; `None` stays on the last page.
    pub completion_url: Option<String>,
}

impl WebState {
    pub fn new(engine: Arc<StepFlowEngine>, completion_url: Option<String>) -> Result<Self> {
        Ok(Self {
            engine,
            renderer: Arc::new(PageRenderer::new()?),
            patterns: Arc::new(RoutePatterns::builtin()?),
            completion_url,
        })
    }
}
