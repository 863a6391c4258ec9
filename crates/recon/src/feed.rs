//! Feed document parsing.
//!
//! The feed answers a grant lookup with an Atom document whose entries wrap
//! typed objects. Only two object categories matter here:
//!
//! ```text
//! <api:object category="publication">
//!   <api:field name="title"><api:text>…</api:text></api:field>
//! </api:object>
//! <api:object category="grant">
//!   <api:field name="funder-name"><api:text>NSF</api:text></api:field>
//!   <api:field name="funder-reference"><api:text>1234567</api:text></api:field>
//! </api:object>
//! ```
//!
//! Namespace prefixes are ignored; elements are matched by local name.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::SyncError;
use crate::model::{FeedRecord, Grant};

const FIELD_TITLE: &str = "title";
const FIELD_FUNDER_NAME: &str = "funder-name";
const FIELD_FUNDER_REFERENCE: &str = "funder-reference";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Publication,
    Grant,
    Other,
}

#[derive(Default)]
struct PendingGrant {
    name: Option<String>,
    reference: Option<String>,
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// The document element must be `feed`; anything else (an HTML error page,
/// a JSON body) is not a grant answer.
fn expect_feed_root(e: &BytesStart<'_>) -> Result<(), SyncError> {
    if e.local_name().as_ref() == b"feed" {
        return Ok(());
    }
    Err(SyncError::FeedParse(format!(
        "expected <feed> document element, found <{}>",
        String::from_utf8_lossy(e.name().as_ref())
    )))
}

/// Resolve one `&name;` reference. Unknown names are kept verbatim.
fn resolve_entity(name: &str) -> String {
    match name {
        "amp" => "&".into(),
        "lt" => "<".into(),
        "gt" => ">".into(),
        "quot" => "\"".into(),
        "apos" => "'".into(),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse().ok()
            } else {
                None
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| format!("&{name};"))
        }
    }
}

/// Parse a feed lookup body into a [`FeedRecord`].
///
/// A grant object without a funder name is an error: it means the feed
/// itself is inconsistent and must not be written through. A blank funder
/// reference is treated as absent. Exact duplicate grants (same name and
/// reference) are collapsed, keeping document order.
///
/// An empty body, a body whose document element is not `feed`, or a
/// document that ends with elements still open is a [`SyncError::FeedParse`].
pub fn parse_feed_record(xml: &str) -> Result<FeedRecord, SyncError> {
    // Entity references split text runs, so values are trimmed only once complete.
    let mut reader = Reader::from_str(xml);

    let mut record = FeedRecord::default();
    let mut objects: Vec<Category> = Vec::new();
    let mut field: Option<String> = None;
    let mut in_text = false;
    let mut text = String::new();
    let mut pending = PendingGrant::default();
    let mut grant_count = 0usize;
    let mut depth = 0usize;
    let mut root_seen = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SyncError::FeedParse(format!("at byte {}: {e}", reader.error_position())))?;

        match event {
            Event::Start(ref e) => {
                if depth == 0 {
                    expect_feed_root(e)?;
                    root_seen = true;
                }
                depth += 1;
                match e.local_name().as_ref() {
                    b"object" => {
                        let category = match attr(e, b"category").as_deref() {
                            Some("publication") => Category::Publication,
                            Some("grant") => {
                                pending = PendingGrant::default();
                                Category::Grant
                            }
                            _ => Category::Other,
                        };
                        objects.push(category);
                    }
                    b"field" => field = attr(e, b"name"),
                    b"text" if field.is_some() => {
                        in_text = true;
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(ref e) if depth == 0 => {
                expect_feed_root(e)?;
                root_seen = true;
            }
            Event::Text(ref e) if in_text => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Event::CData(ref e) if in_text => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Event::GeneralRef(ref e) if in_text => {
                text.push_str(&resolve_entity(&String::from_utf8_lossy(e)));
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"text" if in_text => {
                        in_text = false;
                        let value = text.trim().to_string();
                        match (objects.last(), field.as_deref()) {
                            (Some(Category::Publication), Some(FIELD_TITLE)) => {
                                if record.title.is_none() {
                                    record.title = Some(value);
                                }
                            }
                            (Some(Category::Grant), Some(FIELD_FUNDER_NAME)) => {
                                pending.name = Some(value);
                            }
                            (Some(Category::Grant), Some(FIELD_FUNDER_REFERENCE)) => {
                                pending.reference = Some(value).filter(|v| !v.is_empty());
                            }
                            _ => {}
                        }
                    }
                    b"field" => field = None,
                    b"object" => {
                        if objects.pop() == Some(Category::Grant) {
                            grant_count += 1;
                            let done = std::mem::take(&mut pending);
                            let name = done.name.filter(|n| !n.is_empty()).ok_or_else(|| {
                                SyncError::MissingField {
                                    field: FIELD_FUNDER_NAME.into(),
                                    context: format!("feed grant #{grant_count}"),
                                }
                            })?;
                            let grant = Grant { name, reference: done.reference };
                            if !record.grants.contains(&grant) {
                                record.grants.push(grant);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => {
                if !root_seen {
                    return Err(SyncError::FeedParse("no <feed> document element".into()));
                }
                if depth > 0 {
                    return Err(SyncError::FeedParse(format!(
                        "document truncated with {depth} element(s) still open"
                    )));
                }
                break;
            }
            _ => {}
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(objects: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:api="http://www.symplectic.co.uk/publications/api">
  <entry>
    <api:relationship>
      {objects}
    </api:relationship>
  </entry>
</feed>"#
        )
    }

    const PUBLICATION: &str = r#"
      <api:object category="publication" id="4242">
        <api:field name="title" type="text"><api:text>Dark &amp;lt;i&amp;gt;Matter&amp;lt;/i&amp;gt; Halos</api:text></api:field>
      </api:object>"#;

    fn grant(name: &str, reference: Option<&str>) -> String {
        let reference = reference
            .map(|r| {
                format!(r#"<api:field name="funder-reference" type="text"><api:text>{r}</api:text></api:field>"#)
            })
            .unwrap_or_default();
        format!(
            r#"<api:object category="grant">
                 <api:field name="funder-name" type="text"><api:text>{name}</api:text></api:field>
                 {reference}
               </api:object>"#
        )
    }

    #[test]
    fn parses_title_and_grants_in_order() {
        let xml = doc(&format!(
            "{PUBLICATION}{}{}",
            grant("National Science Foundation", Some("AST-1234")),
            grant("Department of Energy", None),
        ));
        let rec = parse_feed_record(&xml).unwrap();
        assert_eq!(rec.title.as_deref(), Some("Dark &lt;i&gt;Matter&lt;/i&gt; Halos"));
        assert_eq!(
            rec.grants,
            vec![
                Grant::new("National Science Foundation", Some("AST-1234")),
                Grant::new("Department of Energy", None),
            ]
        );
    }

    #[test]
    fn no_grants_is_empty_record() {
        let rec = parse_feed_record(&doc(PUBLICATION)).unwrap();
        assert!(rec.grants.is_empty());
        assert!(rec.title.is_some());
    }

    #[test]
    fn entity_in_funder_name_is_resolved() {
        let rec = parse_feed_record(&doc(&grant("Bill &amp; Melinda Gates Foundation", None))).unwrap();
        assert_eq!(rec.grants[0].name, "Bill & Melinda Gates Foundation");
    }

    #[test]
    fn blank_reference_is_absent() {
        let xml = doc(
            r#"<api:object category="grant">
                 <api:field name="funder-name"><api:text>NIH</api:text></api:field>
                 <api:field name="funder-reference"><api:text>  </api:text></api:field>
               </api:object>"#,
        );
        let rec = parse_feed_record(&xml).unwrap();
        assert_eq!(rec.grants, vec![Grant::new("NIH", None)]);
    }

    #[test]
    fn exact_duplicates_collapse() {
        let xml = doc(&format!("{}{}", grant("NSF", Some("1")), grant("NSF", Some("1"))));
        assert_eq!(parse_feed_record(&xml).unwrap().grants.len(), 1);
    }

    #[test]
    fn missing_funder_name_is_error() {
        let xml = doc(
            r#"<api:object category="grant">
                 <api:field name="funder-reference"><api:text>123</api:text></api:field>
               </api:object>"#,
        );
        let err = parse_feed_record(&xml).unwrap_err();
        match err {
            SyncError::MissingField { field, .. } => assert_eq!(field, "funder-name"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn malformed_document_is_error() {
        let err = parse_feed_record("<feed><entry></feed>").unwrap_err();
        assert!(matches!(err, SyncError::FeedParse(_)), "{err:?}");
    }

    #[test]
    fn empty_body_is_error() {
        for body in ["", "   \n", "<?xml version=\"1.0\"?>"] {
            let err = parse_feed_record(body).unwrap_err();
            assert!(matches!(err, SyncError::FeedParse(_)), "{body:?}: {err:?}");
        }
    }

    #[test]
    fn html_page_is_error() {
        let err = parse_feed_record("<html><body>Service temporarily unavailable</body></html>")
            .unwrap_err();
        match err {
            SyncError::FeedParse(msg) => assert!(msg.contains("<html>"), "{msg}"),
            other => panic!("expected FeedParse, got {other:?}"),
        }
    }

    #[test]
    fn truncated_document_is_error() {
        let full = doc(&grant("NSF", Some("1")));
        let cut = &full[..full.find("</api:relationship>").unwrap()];
        let err = parse_feed_record(cut).unwrap_err();
        assert!(matches!(err, SyncError::FeedParse(_)), "{err:?}");
    }

    #[test]
    fn empty_feed_element_is_empty_record() {
        let rec = parse_feed_record(r#"<feed xmlns="http://www.w3.org/2005/Atom"/>"#).unwrap();
        assert_eq!(rec, FeedRecord::default());
    }

    #[test]
    fn resolve_numeric_entities() {
        assert_eq!(resolve_entity("#39"), "'");
        assert_eq!(resolve_entity("#x41"), "A");
        assert_eq!(resolve_entity("nbsp"), "&nbsp;");
    }
}
