//! HTML rendering of a step page.
//!
//! Saved values reach the template already HTML-encoded (the engine encodes submitted
//! text before storing it) and controller defaults are trusted, so field values are
//! emitted with triple-stash. Labels and messages go through normal escaping.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde_json::{json, Value};

use crate::engine::token::TOKEN_FIELD;
use crate::engine::StepPage;
use crate::models::{FeedbackKind, FieldDescriptor, FieldKind, FieldValue};

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{task_name}} - Step {{step}} of {{total_steps}}</title>
    <style>
        body { font-family: sans-serif; background: #f4f6f9; color: #333; }
        .container { max-width: 720px; margin: 40px auto; background: #fff; padding: 32px; border-radius: 8px; }
        .error-message { background: #fdecea; color: #a12622; padding: 12px; border-radius: 4px; margin-bottom: 16px; }
        .info-message { background: #e8f1fb; color: #1d4f91; padding: 12px; border-radius: 4px; margin-bottom: 16px; }
        .form-group { margin-bottom: 16px; }
        .form-group label { display: block; font-weight: 500; margin-bottom: 4px; }
        .button-group { display: flex; gap: 8px; margin-top: 24px; }
        .step-counter { color: #777; font-size: 0.9em; }
    </style>
</head>
<body>
<div class="container">
    {{#if feedback}}
    <div class="{{feedback.class}}">{{feedback.message}}</div>
    {{/if}}

    <p class="step-counter">Step {{step}} of {{total_steps}}</p>
    <h1>{{task_name}}</h1>

    <form method="POST" action="/page/submit">
        <input type="hidden" name="{{token_field}}" value="{{token}}">
        {{#each fields}}
        <div class="form-group">
            {{#if is_info}}
            {{#if label}}<h3>{{label}}</h3>{{/if}}
            <p>{{{value}}}</p>
            {{/if}}
            {{#if is_input}}
            <label for="{{key}}">{{label}}{{#if required}} *{{/if}}</label>
            <input type="{{kind}}" name="{{key}}" id="{{key}}" value="{{{value}}}"{{#if required}} required{{/if}}>
            {{/if}}
            {{#if is_checkbox}}
            <label><input type="checkbox" name="{{key}}" id="{{key}}" value="yes"{{#if checked}} checked{{/if}}> {{label}}</label>
            {{/if}}
            {{#if is_select}}
            <label for="{{key}}">{{label}}</label>
            <select name="{{key}}" id="{{key}}">
                {{#each options}}
                <option value="{{value}}"{{#if selected}} selected{{/if}}>{{value}}</option>
                {{/each}}
            </select>
            {{/if}}
        </div>
        {{/each}}

        <div class="button-group">
            {{#if show_back}}<input type="submit" name="submitBack" value="Back">{{/if}}
            {{#if show_next}}<input type="submit" name="submitNext" value="Next">{{/if}}
            {{#if show_complete}}<input type="submit" name="submitComplete" value="Complete">{{/if}}
            <input type="submit" name="submitReset" value="Reset Installation" onclick="return confirm('Are you sure you want to reset the installation? This action cannot be undone.');">
        </div>
    </form>
</div>
</body>
</html>
"#;

pub struct PageRenderer {
    handlebars: Handlebars<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars
            .register_template_string("page", PAGE_TEMPLATE)
            .context("Failed to register page template")?;
        Ok(Self { handlebars })
    }

    pub fn render(&self, page: &StepPage) -> Result<String> {
        self.handlebars
            .render("page", &page_context(page))
            .context("Failed to render page template")
    }
}

fn page_context(page: &StepPage) -> Value {
    let feedback = page.feedback.as_ref().map(|f| {
        json!({
            "class": match f.kind {
                FeedbackKind::Error => "error-message",
                FeedbackKind::Info => "info-message",
            },
            "message": f.message,
        })
    });
    json!({
        "step": page.step,
        "total_steps": page.total_steps,
        "task_name": page.task_name,
        "feedback": feedback,
        "token_field": TOKEN_FIELD,
        "token": page.token,
        "fields": page.fields.iter().map(field_context).collect::<Vec<_>>(),
        "show_back": page.navigation.show_back,
        "show_next": page.navigation.show_next,
        "show_complete": page.navigation.show_complete,
    })
}

fn field_context(field: &FieldDescriptor) -> Value {
    let value = match (&field.kind, &field.value) {
        // Never echo a password back into the page.
        (FieldKind::Password, _) => String::new(),
        (_, FieldValue::Text(s)) => s.clone(),
        (_, FieldValue::Bool(_)) => String::new(),
    };
    let options: Vec<Value> = field
        .options
        .iter()
        .map(|o| json!({ "value": o, "selected": field.value.as_text() == Some(o.as_str()) }))
        .collect();
    json!({
        "key": field.key,
        "label": field.label,
        "kind": field.kind.as_str(),
        "value": value,
        "required": field.required,
        "checked": field.value.as_bool() == Some(true),
        "options": options,
        "is_info": field.kind == FieldKind::Info,
        "is_input": matches!(field.kind, FieldKind::Text | FieldKind::Password | FieldKind::Email),
        "is_checkbox": field.kind == FieldKind::Checkbox,
        "is_select": field.kind == FieldKind::Select,
    })
}
