//! Page renderers: one sitemap fragment per page.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future;
use serde_json::{Map, Value};
use smap_store::references;
use smap_templates::{SITEMAP_TEMPLATE, Templates};

use crate::compose::REF_KEY;
use crate::error::{DropReason, Outcome, PipelineError};
use crate::record::{Locals, PageRecord};
use crate::stage::gate;
use crate::{FragmentStream, PageStream};

/// Render each page as its URL followed by a newline.
///
/// Pages without a URL are dropped with a warning.
pub fn pages_to_text(upstream: PageStream) -> FragmentStream {
    gate(upstream, |page: PageRecord| {
        future::ready(match page.url() {
            Some(url) => Outcome::Forward(format!("{url}\n")),
            None => Outcome::dropped(&page.reference, DropReason::MissingUrl),
        })
    })
}

/// Per-page XML rendering capability.
pub trait XmlTransform: Send + Sync {
    /// Render one composed page as a `<url>` element.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the page can't be rendered; this ends
    /// the sitemap stream.
    fn page_xml(&self, page: &PageRecord, locals: &Locals) -> Result<String, PipelineError>;
}

/// Render each composed page through `transform`.
pub fn pages_to_xml(
    upstream: PageStream,
    transform: Arc<dyn XmlTransform>,
    locals: Arc<Locals>,
) -> FragmentStream {
    gate(upstream, move |page: PageRecord| {
        future::ready(Outcome::from(transform.page_xml(&page, &locals)))
    })
}

/// Default XML renderer: `<loc>`, optional `<lastmod>`, then each
/// component's `sitemap` template output in document order.
pub struct TemplateXml {
    templates: Arc<dyn Templates>,
}

impl TemplateXml {
    /// Create a renderer using `templates` for component output.
    #[must_use]
    pub fn new(templates: Arc<dyn Templates>) -> Self {
        Self { templates }
    }

    fn component_xml(
        &self,
        reference: &str,
        data: &Map<String, Value>,
        locals: &Value,
    ) -> Result<String, PipelineError> {
        let Some(template) = self.templates.template(reference, SITEMAP_TEMPLATE) else {
            return Ok(String::new());
        };

        let mut data = data.clone();
        data.insert("locals".to_owned(), locals.clone());
        Ok(self.templates.render(&template, &Value::Object(data))?)
    }
}

impl XmlTransform for TemplateXml {
    fn page_xml(&self, page: &PageRecord, locals: &Locals) -> Result<String, PipelineError> {
        let url = page.url().ok_or_else(|| PipelineError::MissingUrl {
            reference: page.reference.clone(),
        })?;

        let mut xml = format!("<url><loc>{}</loc>", quick_xml::escape::escape(url));
        if let Some(lastmod) = last_modified(page) {
            xml.push_str(&format!("<lastmod>{lastmod}</lastmod>"));
        }

        let locals = locals.to_value();
        for (reference, data) in component_refs(&page.data) {
            xml.push_str(&self.component_xml(reference, data, &locals)?);
        }

        xml.push_str("</url>");
        Ok(xml)
    }
}

/// `lastModified` of a page as an ISO-8601 UTC timestamp with milliseconds.
///
/// Accepts epoch milliseconds (fractions are truncated) or an RFC 3339
/// string. Absent, `null`, `0` and `""` mean no timestamp. Any other value is
/// logged and left out of the page's `<url>` element.
fn last_modified(page: &PageRecord) -> Option<String> {
    let value = page.data.get("lastModified")?;
    let timestamp: Option<DateTime<Utc>> = match value {
        Value::Null => return None,
        Value::String(s) if s.is_empty() => return None,
        Value::Number(n) => match n.as_i64().or_else(|| n.as_f64().and_then(truncate_millis)) {
            Some(0) => return None,
            millis => millis.and_then(DateTime::from_timestamp_millis),
        },
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|timestamp| timestamp.with_timezone(&Utc)),
        _ => None,
    };

    if timestamp.is_none() {
        tracing::warn!(
            reference = %page.reference,
            value = %value,
            "Ignoring invalid lastModified value"
        );
    }
    timestamp.map(|timestamp| timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

// Out-of-range values saturate and are then rejected by `from_timestamp_millis`.
#[allow(clippy::cast_possible_truncation)]
fn truncate_millis(millis: f64) -> Option<i64> {
    millis.is_finite().then(|| millis.trunc() as i64)
}

/// Every resolved component in composed page data, depth-first in document
/// order, each reference listed once.
///
/// All top-level fields are walked, page configuration included. Only
/// objects carrying a `_ref` to a `/_components/` reference count, and
/// composition only places those inside areas.
#[must_use]
pub fn component_refs(data: &Map<String, Value>) -> Vec<(&str, &Map<String, Value>)> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for value in data.values() {
        collect_components(value, &mut seen, &mut found);
    }
    found
}

fn collect_components<'a>(
    value: &'a Value,
    seen: &mut HashSet<&'a str>,
    found: &mut Vec<(&'a str, &'a Map<String, Value>)>,
) {
    match value {
        Value::Object(map) => {
            if let Some(reference) = map
                .get(REF_KEY)
                .and_then(Value::as_str)
                .filter(|reference| references::is_component(reference))
                && seen.insert(reference)
            {
                found.push((reference, map));
            }
            for child in map.values() {
                collect_components(child, seen, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_components(item, seen, found);
            }
        }
        _ => {}
    }
}
