//! Metadata from the command line and from files.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Parses `key=value` pairs, splitting at the first `=`.
///
/// Entries without `=` are skipped. Later pairs replace earlier ones.
#[must_use]
pub fn parse_pairs<I, S>(pairs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut metadata = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        match pair.split_once('=') {
            Some((key, value)) => {
                metadata.insert(key.to_string(), value.to_string());
            }
            None => tracing::warn!(%pair, "Ignoring metadata without '='"),
        }
    }
    metadata
}

/// Parses a JSON object of metadata.
///
/// String values are taken as-is; numbers and booleans are converted to
/// their JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a JSON object or a value is an
/// array, object or null.
pub fn from_json(contents: &str) -> Result<BTreeMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    let serde_json::Value::Object(object) = value else {
        return Err(Error::Metadata("expected a JSON object".into()));
    };

    object
        .into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => Ok((key, s)),
            serde_json::Value::Number(n) => Ok((key, n.to_string())),
            serde_json::Value::Bool(b) => Ok((key, b.to_string())),
            _ => Err(Error::Metadata(format!("value for {key} is not a scalar"))),
        })
        .collect()
}

/// Loads metadata from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON object of
/// scalar values.
pub async fn load_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let contents = tokio::fs::read_to_string(path).await?;
    from_json(&contents)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_at_first_equals() {
        let metadata = parse_pairs(["campaign=spring", "query=a=b", "flag", "empty="]);
        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata["campaign"], "spring");
        assert_eq!(metadata["query"], "a=b");
        assert_eq!(metadata["empty"], "");
        assert!(!metadata.contains_key("flag"));
    }

    #[test]
    fn later_pairs_win() {
        let metadata = parse_pairs(vec!["k=1".to_string(), "k=2".to_string()]);
        assert_eq!(metadata["k"], "2");
    }

    #[test]
    fn json_object_of_scalars() {
        let metadata = from_json(r#"{"a": "1", "b": 2, "c": true}"#).unwrap();
        assert_eq!(metadata["a"], "1");
        assert_eq!(metadata["b"], "2");
        assert_eq!(metadata["c"], "true");
    }

    #[test]
    fn json_rejects_non_objects_and_nesting() {
        assert!(matches!(from_json("[1, 2]"), Err(Error::Metadata(_))));
        assert!(matches!(from_json(r#"{"a": {"b": 1}}"#), Err(Error::Metadata(_))));
        assert!(matches!(from_json("{"), Err(Error::Serde(_))));
    }

    #[tokio::test]
    async fn load_file_reads_json() {
        let path = std::env::temp_dir().join(format!("vmtp-meta-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"{"trace": "abc"}"#).await.unwrap();

        let metadata = load_file(&path).await.unwrap();
        assert_eq!(metadata["trace"], "abc");
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
