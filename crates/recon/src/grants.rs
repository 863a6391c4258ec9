//! Canonical, order-independent grant sets.
//!
//! Both sides of a comparison reduce to a [`GrantSet`] of funder names.
//! Reference codes are not part of the key; the repository's stored form
//! has none.

use std::collections::BTreeSet;
use std::fmt;

use crate::model::{FeedRecord, RepositoryItem};

/// Separator used in the canonical string form.
pub const GRANT_DELIMITER: &str = "||";

/// `join("||", sort(unique(names)))`. Empty input yields `""`.
pub fn canonicalize<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    GrantSet::from_names(names).canonical()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantSet {
    names: BTreeSet<String>,
}

impl GrantSet {
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            names: names.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn canonical(&self) -> String {
        self.names
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(GRANT_DELIMITER)
    }
}

impl fmt::Display for GrantSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Anything that can be reduced to a [`GrantSet`].
pub trait GrantSource {
    fn grant_names(&self) -> Vec<&str>;

    fn grant_set(&self) -> GrantSet {
        GrantSet::from_names(self.grant_names())
    }
}

impl GrantSource for FeedRecord {
    fn grant_names(&self) -> Vec<&str> {
        self.grants.iter().map(|g| g.name.as_str()).collect()
    }
}

impl GrantSource for RepositoryItem {
    fn grant_names(&self) -> Vec<&str> {
        self.grants.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Grant;

    #[test]
    fn canonical_sorts_and_dedups() {
        assert_eq!(canonicalize(["NSF", "DOE", "NSF"]), "DOE||NSF");
    }

    #[test]
    fn empty_is_sentinel() {
        assert_eq!(canonicalize(std::iter::empty()), "");
        assert!(GrantSet::default().is_empty());
    }

    #[test]
    fn single_name_has_no_delimiter() {
        assert_eq!(canonicalize(["NIH"]), "NIH");
    }

    #[test]
    fn feed_and_item_adapters_agree() {
        let feed = FeedRecord {
            title: None,
            grants: vec![
                Grant::new("NSF", Some("1234")),
                Grant::new("DOE", None),
                Grant::new("NSF", Some("5678")),
            ],
        };
        let item = RepositoryItem {
            id: "qt1".into(),
            title: "T".into(),
            added: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            grants: vec!["DOE".into(), "NSF".into()],
            local_ids: vec![],
        };
        assert_eq!(feed.grant_set(), item.grant_set());
        assert_eq!(feed.grant_set().len(), 2);
    }
}
