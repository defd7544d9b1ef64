//! Ordered query-parameter multimap.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Query parameters keyed by name, in first-occurrence order.
///
/// Repeated keys accumulate values in the order they were seen, so
/// `page=5&page=6` decodes to `page -> [5, 6]` and encodes back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, Vec<String>)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.0.push((key, vec![value])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Every `(key, value)` pair, grouped by key.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// One comma-joined value per key.
    pub fn joined(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, values)| (k.clone(), values.join(",")))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.append(k, v);
        }
        params
    }
}

impl Serialize for QueryParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, values) in &self.0 {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_groups_by_first_occurrence() {
        let params: QueryParams = [("count", "100"), ("page", "5"), ("count", "200"), ("page", "6")]
            .into_iter()
            .collect();

        assert_eq!(params.len(), 2);
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["count", "page"]);
        assert_eq!(params.get("page").unwrap(), ["5", "6"]);
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_pairs_and_joined() {
        let params: QueryParams = [("page", "5"), ("count", "1"), ("page", "6")]
            .into_iter()
            .collect();

        let pairs: Vec<_> = params.pairs().collect();
        assert_eq!(pairs, vec![("page", "5"), ("page", "6"), ("count", "1")]);
        assert_eq!(
            params.joined(),
            vec![
                ("page".to_string(), "5,6".to_string()),
                ("count".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let params: QueryParams = [("z", "1"), ("a", "2"), ("z", "3")].into_iter().collect();
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"z":["1","3"],"a":["2"]}"#);
    }
}
