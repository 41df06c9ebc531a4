//! Component templates for sitemap rendering.
//!
//! Every component may ship a `sitemap` template next to its display
//! templates. This crate looks those templates up by component reference and
//! renders them through whichever engine the template's file extension names.
//!
//! - [`Templates`]: lookup + render capability consumed by the sitemap pipeline
//! - [`Multiplex`]: registry of named [`Engine`]s (`jinja`, `xml`)
//! - [`TemplateDir`]: loads `<root>/<component>/<template>.<engine>` files
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use smap_templates::{Multiplex, TemplateDir, Templates};
//!
//! let templates = TemplateDir::load(Path::new("components"), Multiplex::default())?;
//! if let Some(template) = templates.template("site/_components/article/instances/a", "sitemap") {
//!     let xml = templates.render(&template, &serde_json::json!({"title": "Hello"}))?;
//! }
//! ```

mod dir;
mod engine;

pub use dir::TemplateDir;
pub use engine::{Engine, JinjaEngine, Multiplex, VerbatimEngine};

/// Name of the per-component template used for sitemap rendering.
pub const SITEMAP_TEMPLATE: &str = "sitemap";

/// A component template resolved by [`Templates::template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Component name the template belongs to (e.g. `"article"`).
    pub component: String,
    /// Template name (e.g. `"sitemap"`).
    pub name: String,
    /// Engine that renders it (the file extension, e.g. `"jinja"`).
    pub engine: String,
    /// Template source.
    pub source: String,
}

impl Template {
    /// Identifier used in logs and errors (`article/sitemap.jinja`).
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}/{}.{}", self.component, self.name, self.engine)
    }
}

/// Template lookup and rendering capability.
pub trait Templates: Send + Sync {
    /// Find the template called `name` for the component behind `component_ref`.
    ///
    /// Returns `None` if the component has no such template.
    fn template(&self, component_ref: &str, name: &str) -> Option<Template>;

    /// Render a template with the given data.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if no engine handles the template or the
    /// engine fails.
    fn render(&self, template: &Template, data: &serde_json::Value) -> Result<String, TemplateError>;
}

/// Template loading and rendering error.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template directory could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path being read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// No engine registered under this name.
    #[error("Unknown template engine: {0}")]
    UnknownEngine(String),

    /// The engine failed to render the template.
    #[error("Failed to render {template}: {message}")]
    Render {
        /// Template identifier.
        template: String,
        /// Engine error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_template_id() {
        let template = Template {
            component: "article".to_owned(),
            name: SITEMAP_TEMPLATE.to_owned(),
            engine: "jinja".to_owned(),
            source: String::new(),
        };

        assert_eq!(template.id(), "article/sitemap.jinja");
    }

    #[test]
    fn test_template_error_display() {
        let err = TemplateError::UnknownEngine("pug".to_owned());

        assert_eq!(err.to_string(), "Unknown template engine: pug");
    }
}
