//! Input records handed to the orchestrator.
//!
//! A [`Row`] is an ordered mapping from column name to the raw string value
//! read from the source file. Rows are immutable once built; cloning one is
//! cheap because the underlying map is shared.

use std::sync::Arc;

use indexmap::IndexMap;

/// One input record, keyed by column name in file order.
///
/// # Examples
///
/// ```
/// use csvpoints_core::Row;
///
/// let row = Row::from_pairs([("name", "Museum"), ("address", "1 Main St")]);
/// assert_eq!(row.get("address"), Some("1 Main St"));
/// assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "address"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    values: Arc<IndexMap<String, String>>,
}

impl Row {
    /// Wrap an already-built column map.
    #[must_use]
    pub fn new(values: IndexMap<String, String>) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    /// Build a row from `(column, value)` pairs, preserving their order.
    ///
    /// A repeated column keeps its first position and its last value.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// Raw value stored under `column`, if the column exists.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Column names in file order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// `(column, value)` pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(column, value)| (column.as_str(), value.as_str()))
    }

    /// Borrow the underlying ordered map.
    #[must_use]
    pub fn as_map(&self) -> &IndexMap<String, String> {
        &self.values
    }

    /// Number of columns held by the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row holds no columns at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}
