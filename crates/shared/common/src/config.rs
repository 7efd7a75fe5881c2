//! CRUD service configuration.
//!
//! Log messages are rendered from configurable templates with positional
//! placeholders (`%s` or `{}`), filled in order with runtime values such as
//! the record type, the record id and the calling method.

use std::env;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Identifies one log message template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// Arguments: record type, id
    NotFound,
    /// Arguments: record type, calling method
    CreateFailed,
    /// Arguments: record type, id, calling method
    UpdateFailed,
    /// Arguments: record type, id
    DeleteFailed,
    /// No arguments
    RetrievalError,
    /// Arguments: record type, relationship, calling method
    RelationshipFailed,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 6] = [
        TemplateKey::NotFound,
        TemplateKey::CreateFailed,
        TemplateKey::UpdateFailed,
        TemplateKey::DeleteFailed,
        TemplateKey::RetrievalError,
        TemplateKey::RelationshipFailed,
    ];

    /// Environment variable overriding this template
    pub fn env_var(&self) -> &'static str {
        match self {
            TemplateKey::NotFound => "LOG_NOT_FOUND_MESSAGE",
            TemplateKey::CreateFailed => "LOG_CREATE_FAILED_MESSAGE",
            TemplateKey::UpdateFailed => "LOG_UPDATE_FAILED_MESSAGE",
            TemplateKey::DeleteFailed => "LOG_DELETE_FAILED_MESSAGE",
            TemplateKey::RetrievalError => "LOG_RETRIEVAL_ERROR_MESSAGE",
            TemplateKey::RelationshipFailed => "LOG_RELATIONSHIP_FAILED_MESSAGE",
        }
    }

    /// Built-in template used when nothing is configured
    pub fn default_template(&self) -> &'static str {
        match self {
            TemplateKey::NotFound => "Unable to locate %s with id %s",
            TemplateKey::CreateFailed => "Failed to create %s in %s",
            TemplateKey::UpdateFailed => "Failed to update %s with id %s in %s",
            TemplateKey::DeleteFailed => "Failed to delete %s with id %s",
            TemplateKey::RetrievalError => "Failed to retrieve records",
            TemplateKey::RelationshipFailed => "Failed to save %s relationship %s in %s",
        }
    }
}

/// Log message templates, one per [`TemplateKey`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub not_found: String,
    pub create_failed: String,
    pub update_failed: String,
    pub delete_failed: String,
    pub retrieval_error: String,
    pub relationship_failed: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            not_found: TemplateKey::NotFound.default_template().to_string(),
            create_failed: TemplateKey::CreateFailed.default_template().to_string(),
            update_failed: TemplateKey::UpdateFailed.default_template().to_string(),
            delete_failed: TemplateKey::DeleteFailed.default_template().to_string(),
            retrieval_error: TemplateKey::RetrievalError.default_template().to_string(),
            relationship_failed: TemplateKey::RelationshipFailed.default_template().to_string(),
        }
    }
}

impl MessageTemplates {
    /// Load templates from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut templates = Self::default();
        for key in TemplateKey::ALL {
            if let Ok(template) = env::var(key.env_var()) {
                templates.set(key, template);
            }
        }
        templates
    }

    pub fn get(&self, key: TemplateKey) -> &str {
        match key {
            TemplateKey::NotFound => &self.not_found,
            TemplateKey::CreateFailed => &self.create_failed,
            TemplateKey::UpdateFailed => &self.update_failed,
            TemplateKey::DeleteFailed => &self.delete_failed,
            TemplateKey::RetrievalError => &self.retrieval_error,
            TemplateKey::RelationshipFailed => &self.relationship_failed,
        }
    }

    pub fn set(&mut self, key: TemplateKey, template: impl Into<String>) {
        let slot = match key {
            TemplateKey::NotFound => &mut self.not_found,
            TemplateKey::CreateFailed => &mut self.create_failed,
            TemplateKey::UpdateFailed => &mut self.update_failed,
            TemplateKey::DeleteFailed => &mut self.delete_failed,
            TemplateKey::RetrievalError => &mut self.retrieval_error,
            TemplateKey::RelationshipFailed => &mut self.relationship_failed,
        };
        *slot = template.into();
    }

    /// Render a template with positional arguments.
    ///
    /// Each `%s` or `{}` takes the next argument; `%%` is a literal percent.
    /// Placeholders without an argument render empty, extra arguments are
    /// ignored.
    pub fn render(&self, key: TemplateKey, args: &[&dyn Display]) -> String {
        render_template(self.get(key), args)
    }
}

fn render_template(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match (ch, chars.peek()) {
            ('%', Some('s')) | ('{', Some('}')) => {
                chars.next();
                if let Some(arg) = args.next() {
                    out.push_str(&arg.to_string());
                }
            }
            ('%', Some('%')) => {
                chars.next();
                out.push('%');
            }
            _ => out.push(ch),
        }
    }

    out
}

/// CRUD service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrudConfig {
    /// Log message templates
    pub templates: MessageTemplates,
    /// Attach the fault's source chain to error log contexts
    pub include_trace: bool,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            templates: MessageTemplates::default(),
            include_trace: true,
        }
    }
}

impl CrudConfig {
    /// Load configuration from environment variables (and `.env`).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            templates: MessageTemplates::from_env(),
            include_trace: env::var("LOG_INCLUDE_TRACE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}
