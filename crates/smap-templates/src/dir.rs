//! Directory-backed template lookup.

use std::collections::HashMap;
use std::path::Path;

use smap_store::references;

use crate::{Multiplex, Template, TemplateError, Templates};

/// Templates loaded from a components directory.
///
/// Layout: `<root>/<component>/<template>.<engine>`, e.g.
/// `components/article/sitemap.jinja`. Files whose extension names no
/// registered engine are skipped.
pub struct TemplateDir {
    templates: HashMap<(String, String), Template>,
    multiplex: Multiplex,
}

impl TemplateDir {
    /// Template set with no templates.
    #[must_use]
    pub fn empty(multiplex: Multiplex) -> Self {
        Self {
            templates: HashMap::new(),
            multiplex,
        }
    }

    /// Add a template (e.g. for tests, or templates not kept on disk).
    #[must_use]
    pub fn with_template(
        mut self,
        component: impl Into<String>,
        name: impl Into<String>,
        engine: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let template = Template {
            component: component.into(),
            name: name.into(),
            engine: engine.into(),
            source: source.into(),
        };
        self.templates.insert(
            (template.component.clone(), template.name.clone()),
            template,
        );
        self
    }

    /// Load every template under `root`.
    ///
    /// A missing `root` yields an empty template set, so sites without
    /// sitemap templates still render `<loc>`-only entries.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Io`] if a directory or file can't be read.
    pub fn load(root: &Path, multiplex: Multiplex) -> Result<Self, TemplateError> {
        let mut dir = Self::empty(multiplex);
        if !root.is_dir() {
            tracing::warn!(root = %root.display(), "Templates directory not found");
            return Ok(dir);
        }

        for component in read_dir(root)? {
            if !component.is_dir() {
                continue;
            }
            let Some(component_name) = file_name(&component) else {
                continue;
            };

            for file in read_dir(&component)? {
                let (Some(name), Some(engine)) = (
                    file.file_stem().and_then(|s| s.to_str()),
                    file.extension().and_then(|s| s.to_str()),
                ) else {
                    continue;
                };
                if !file.is_file() || !dir.multiplex.handles(engine) {
                    tracing::debug!(path = %file.display(), "Skipping non-template file");
                    continue;
                }

                let source = std::fs::read_to_string(&file).map_err(|source| TemplateError::Io {
                    path: file.display().to_string(),
                    source,
                })?;
                dir = dir.with_template(component_name.clone(), name, engine, source);
            }
        }

        tracing::debug!(root = %root.display(), templates = dir.len(), "Loaded templates");
        Ok(dir)
    }

    /// Number of loaded templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no templates are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Templates for TemplateDir {
    fn template(&self, component_ref: &str, name: &str) -> Option<Template> {
        let component = references::component_name(component_ref)?;
        self.templates
            .get(&(component.to_owned(), name.to_owned()))
            .cloned()
    }

    fn render(&self, template: &Template, data: &serde_json::Value) -> Result<String, TemplateError> {
        self.multiplex.render(template, data)
    }
}

fn read_dir(path: &Path) -> Result<Vec<std::path::PathBuf>, TemplateError> {
    let io_error = |source| TemplateError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut paths = std::fs::read_dir(path)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
}
