use std::fmt;

#[derive(Debug)]
pub enum SyncError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty unit list, bad page size, etc.).
    ConfigValidation(String),
    /// Neither dry-run nor apply was selected.
    NoRunMode,
    /// Item carries no local identifier with the required scheme.
    MissingLocalId { scheme: String },
    /// Required field absent from an upstream record.
    MissingField { field: String, context: String },
    /// Feed document is not well-formed.
    FeedParse(String),
    /// Listing or lookup service failed at the transport level.
    Upstream { service: String, message: String },
    /// Cursor paging went wrong (stuck cursor, empty non-terminal page).
    Pagination(String),
    /// The update applier rejected or failed to persist a funding change.
    UpdateFailed { item_id: String, message: String },
    /// Result log write error.
    Io(String),
    /// Any of the above, raised while fetching one listing page.
    Listing {
        unit: String,
        page: u32,
        source: Box<SyncError>,
    },
    /// Any of the above, raised while processing one item.
    Item {
        unit: String,
        item_id: String,
        pub_id: Option<String>,
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Annotate with the identifiers of the item in scope. Already-annotated
    /// errors pass through untouched.
    pub fn for_item(self, unit: &str, item_id: &str, pub_id: Option<&str>) -> Self {
        match self {
            Self::Item { .. } => self,
            other => Self::Item {
                unit: unit.to_string(),
                item_id: item_id.to_string(),
                pub_id: pub_id.map(str::to_string),
                source: Box::new(other),
            },
        }
    }

    /// Annotate a listing failure with the unit and 1-based page number.
    pub fn for_page(self, unit: &str, page: u32) -> Self {
        match self {
            Self::Listing { .. } | Self::Item { .. } => self,
            other => Self::Listing {
                unit: unit.to_string(),
                page,
                source: Box::new(other),
            },
        }
    }

    /// Innermost error, with any item or page annotation stripped.
    pub fn root(&self) -> &SyncError {
        match self {
            Self::Item { source, .. } | Self::Listing { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::NoRunMode => write!(f, "no run mode selected: choose dry-run or apply"),
            Self::MissingLocalId { scheme } => {
                write!(f, "item has no local identifier with scheme '{scheme}'")
            }
            Self::MissingField { field, context } => {
                write!(f, "{context}: missing required field '{field}'")
            }
            Self::FeedParse(msg) => write!(f, "feed document parse error: {msg}"),
            Self::Upstream { service, message } => write!(f, "{service} error: {message}"),
            Self::Pagination(msg) => write!(f, "pagination error: {msg}"),
            Self::UpdateFailed { item_id, message } => {
                write!(f, "update of '{item_id}' failed: {message}")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Listing { unit, page, source } => {
                write!(f, "unit '{unit}', listing page {page}: {source}")
            }
            Self::Item { unit, item_id, pub_id, source } => {
                let pub_id = pub_id.as_deref().unwrap_or("-");
                write!(f, "unit '{unit}', item '{item_id}', pub '{pub_id}': {source}")
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Item { source, .. } | Self::Listing { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_annotation_names_identifiers() {
        let err = SyncError::MissingField {
            field: "funder-name".into(),
            context: "grant #2".into(),
        }
        .for_item("lbnl_rw", "qt12345678", Some("998877"));

        let msg = err.to_string();
        assert!(msg.contains("lbnl_rw"), "{msg}");
        assert!(msg.contains("qt12345678"), "{msg}");
        assert!(msg.contains("998877"), "{msg}");
        assert!(msg.contains("funder-name"), "{msg}");
    }

    #[test]
    fn annotation_applies_once() {
        let err = SyncError::Io("disk full".into())
            .for_item("u1", "qt1", None)
            .for_item("u2", "qt2", None);
        match &err {
            SyncError::Item { unit, item_id, .. } => {
                assert_eq!(unit, "u1");
                assert_eq!(item_id, "qt1");
            }
            other => panic!("expected Item, got {other:?}"),
        }
        assert!(matches!(err.root(), SyncError::Io(_)));
    }

    #[test]
    fn page_annotation_names_unit_and_page() {
        let err = SyncError::MissingField {
            field: "added".into(),
            context: "item 'qt9' (unparseable value 'yesterday')".into(),
        }
        .for_page("lbnl_rw", 3);

        assert_eq!(
            err.to_string(),
            "unit 'lbnl_rw', listing page 3: item 'qt9' (unparseable value 'yesterday'): missing required field 'added'"
        );
        assert!(matches!(err.root(), SyncError::MissingField { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
