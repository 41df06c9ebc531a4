//! Template engines and the engine multiplexer.

use std::collections::BTreeMap;

use minijinja::Environment;

use crate::{Template, TemplateError};

/// A named template engine.
pub trait Engine: Send + Sync {
    /// Render `template` with `data`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Render`] if rendering fails.
    fn render(&self, template: &Template, data: &serde_json::Value) -> Result<String, TemplateError>;
}

/// Jinja2-style templates via `minijinja`.
///
/// String templates are not auto-escaped; templates escape interpolated
/// values themselves with the `escape` filter where needed.
pub struct JinjaEngine {
    env: Environment<'static>,
}

impl Default for JinjaEngine {
    fn default() -> Self {
        Self {
            env: Environment::new(),
        }
    }
}

impl Engine for JinjaEngine {
    fn render(&self, template: &Template, data: &serde_json::Value) -> Result<String, TemplateError> {
        self.env
            .render_str(&template.source, data)
            .map_err(|e| TemplateError::Render {
                template: template.id(),
                message: e.to_string(),
            })
    }
}

/// Static fragments emitted verbatim, ignoring data.
#[derive(Default)]
pub struct VerbatimEngine;

impl Engine for VerbatimEngine {
    fn render(&self, template: &Template, _data: &serde_json::Value) -> Result<String, TemplateError> {
        Ok(template.source.clone())
    }
}

/// Registry of engines keyed by name, dispatching on [`Template::engine`].
pub struct Multiplex {
    engines: BTreeMap<String, Box<dyn Engine>>,
}

impl Default for Multiplex {
    /// All built-in engines: `jinja` and `xml`.
    fn default() -> Self {
        Self::empty()
            .with_engine("jinja", JinjaEngine::default())
            .with_engine("xml", VerbatimEngine)
    }
}

impl Multiplex {
    /// Names of the built-in engines.
    pub const BUILTIN: [&'static str; 2] = ["jinja", "xml"];

    /// Registry with no engines.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            engines: BTreeMap::new(),
        }
    }

    /// Register an engine under `name`, replacing any previous one.
    #[must_use]
    pub fn with_engine(mut self, name: impl Into<String>, engine: impl Engine + 'static) -> Self {
        self.engines.insert(name.into(), Box::new(engine));
        self
    }

    /// Build a registry holding only the named built-in engines.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownEngine`] for a name that isn't built in.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, TemplateError> {
        names.iter().try_fold(Self::empty(), |multiplex, name| {
            match name.as_ref() {
                "jinja" => Ok(multiplex.with_engine("jinja", JinjaEngine::default())),
                "xml" => Ok(multiplex.with_engine("xml", VerbatimEngine)),
                other => Err(TemplateError::UnknownEngine(other.to_owned())),
            }
        })
    }

    /// Whether an engine is registered under `name`.
    #[must_use]
    pub fn handles(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    /// Render a template with the engine it names.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownEngine`] if no engine is registered
    /// for the template, or the engine's error.
    pub fn render(&self, template: &Template, data: &serde_json::Value) -> Result<String, TemplateError> {
        self.engines
            .get(&template.engine)
            .ok_or_else(|| TemplateError::UnknownEngine(template.engine.clone()))?
            .render(template, data)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn template(engine: &str, source: &str) -> Template {
        Template {
            component: "article".to_owned(),
            name: "sitemap".to_owned(),
            engine: engine.to_owned(),
            source: source.to_owned(),
        }
    }

    #[test]
    fn test_jinja_renders_data_and_locals() {
        let multiplex = Multiplex::default();
        let data = json!({"title": "Hi", "locals": {"site": {"host": "a.com"}}});

        let out = multiplex
            .render(&template("jinja", "<t>{{ title }}@{{ locals.site.host }}</t>"), &data)
            .unwrap();

        assert_eq!(out, "<t>Hi@a.com</t>");
    }

    #[test]
    fn test_jinja_loops_over_component_data() {
        let multiplex = Multiplex::default();
        let source = "{% for image in images %}<image:loc>{{ image }}</image:loc>{% endfor %}";

        let out = multiplex
            .render(&template("jinja", source), &json!({"images": ["a.png", "b.png"]}))
            .unwrap();

        assert_eq!(out, "<image:loc>a.png</image:loc><image:loc>b.png</image:loc>");
    }

    #[test]
    fn test_jinja_syntax_error() {
        let multiplex = Multiplex::default();

        let err = multiplex
            .render(&template("jinja", "{% if %}"), &json!({}))
            .unwrap_err();

        assert!(matches!(err, TemplateError::Render { ref template, .. } if template == "article/sitemap.jinja"));
    }

    #[test]
    fn test_verbatim() {
        let multiplex = Multiplex::default();

        let out = multiplex
            .render(&template("xml", "<foo>bar</foo>"), &json!({"ignored": 1}))
            .unwrap();

        assert_eq!(out, "<foo>bar</foo>");
    }

    #[test]
    fn test_unknown_engine() {
        let multiplex = Multiplex::from_names(&["xml"]).unwrap();

        let err = multiplex
            .render(&template("jinja", ""), &json!({}))
            .unwrap_err();

        assert!(matches!(err, TemplateError::UnknownEngine(name) if name == "jinja"));
    }

    #[test]
    fn test_from_names_rejects_unknown() {
        assert!(Multiplex::from_names(&["jinja", "pug"]).is_err());
        assert!(Multiplex::from_names(&Multiplex::BUILTIN).is_ok());
    }
}
