//! Page records and request context.

use serde_json::{Map, Value};
use smap_store::Entry;

use crate::error::PipelineError;

/// One page revision flowing through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// Store key of the revision (e.g. `example.com/_pages/home@published`).
    pub reference: String,
    /// Page configuration and, before composition, component references by area.
    pub data: Map<String, Value>,
}

impl PageRecord {
    /// Create a record.
    #[must_use]
    pub fn new(reference: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            reference: reference.into(),
            data,
        }
    }

    /// Parse a scanned store entry: the key is the reference, the value a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedRecord`] if the value isn't a JSON object.
    pub fn parse(entry: Entry) -> Result<Self, PipelineError> {
        let data = serde_json::from_str(&entry.value).map_err(|source| {
            PipelineError::MalformedRecord {
                key: entry.key.clone(),
                source,
            }
        })?;
        Ok(Self::new(entry.key, data))
    }

    /// Page URL, if set and non-empty.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.data
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
    }
}

/// Site the sitemap is generated for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteLocals {
    /// Namespace prefix of the site's keys.
    pub prefix: String,
    /// Public host name.
    pub host: String,
}

/// Per-request context handed to the composer and to sitemap templates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locals {
    /// Site being rendered.
    pub site: SiteLocals,
    /// Additional request values (query parameters, caller-supplied data).
    pub extra: Map<String, Value>,
}

impl Locals {
    /// Context for a site.
    #[must_use]
    pub fn for_site(prefix: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            site: SiteLocals {
                prefix: prefix.into(),
                host: host.into(),
            },
            extra: Map::new(),
        }
    }

    /// JSON form exposed to templates as `locals`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut site = Map::new();
        site.insert("prefix".to_owned(), Value::String(self.site.prefix.clone()));
        site.insert("host".to_owned(), Value::String(self.site.host.clone()));

        let mut locals = self.extra.clone();
        locals.insert("site".to_owned(), Value::Object(site));
        Value::Object(locals)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_entry() {
        let record = PageRecord::parse(Entry {
            key: "/baz/zar@published".to_owned(),
            value: r#"{"url": "zar"}"#.to_owned(),
        })
        .unwrap();

        assert_eq!(record.reference, "/baz/zar@published");
        assert_eq!(Value::Object(record.data), json!({"url": "zar"}));
    }

    #[test]
    fn test_parse_malformed_entry() {
        let err = PageRecord::parse(Entry {
            key: "site/_pages/a".to_owned(),
            value: "{not json".to_owned(),
        })
        .unwrap_err();

        assert!(matches!(err, PipelineError::MalformedRecord { ref key, .. } if key == "site/_pages/a"));
    }

    #[test]
    fn test_parse_non_object_entry() {
        let err = PageRecord::parse(Entry {
            key: "site/_pages/a".to_owned(),
            value: "[1]".to_owned(),
        })
        .unwrap_err();

        assert!(matches!(err, PipelineError::MalformedRecord { .. }));
    }

    #[test]
    fn test_url() {
        let with_url = PageRecord::parse(Entry {
            key: "a".to_owned(),
            value: r#"{"url": "http://a"}"#.to_owned(),
        })
        .unwrap();
        let empty_url = PageRecord::parse(Entry {
            key: "b".to_owned(),
            value: r#"{"url": ""}"#.to_owned(),
        })
        .unwrap();

        assert_eq!(with_url.url(), Some("http://a"));
        assert_eq!(empty_url.url(), None);
    }

    #[test]
    fn test_locals_to_value() {
        let mut locals = Locals::for_site("example.com", "www.example.com");
        locals.extra.insert("edit".to_owned(), json!(false));

        assert_eq!(
            locals.to_value(),
            json!({"edit": false, "site": {"prefix": "example.com", "host": "www.example.com"}})
        );
    }
}
