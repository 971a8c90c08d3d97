//! Deterministic configuration tokens

use std::fmt;

use serde_json::Value;

/// A deterministic identifier for a registered configuration.
///
/// Derived from a content digest of the canonical configuration document
/// combined with the caller scope. `serde_json::Value` serializes object
/// keys in sorted order, so byte-different but semantically identical
/// documents digest to the same token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Derive the token for a scope and raw configuration document
    pub fn derive(scope: &str, config: &Value) -> Token {
        let mut hasher = blake3::Hasher::new();
        hasher.update(scope.as_bytes());
        hasher.update(&[0]);
        hasher.update(config.to_string().as_bytes());
        Token(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token(value.to_string())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key under which a token's entry lives in the backing store
pub(crate) fn store_key(token: &str) -> String {
    format!("mapcfg:{}", token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_ignores_key_order() {
        let a = json!({ "version": "1.5.0", "layers": [], "dataviews": {} });
        let b: Value =
            serde_json::from_str(r#"{"dataviews":{},"layers":[],"version":"1.5.0"}"#).unwrap();
        assert_eq!(Token::derive("localhost", &a), Token::derive("localhost", &b));
    }

    #[test]
    fn test_token_scoped_by_caller() {
        let config = json!({ "layers": [] });
        assert_ne!(
            Token::derive("alice", &config),
            Token::derive("bob", &config)
        );
    }

    #[test]
    fn test_token_changes_with_content() {
        let a = json!({ "layers": [] });
        let b = json!({ "layers": [{ "type": "mapnik", "options": {} }] });
        assert_ne!(Token::derive("s", &a), Token::derive("s", &b));
    }
}
