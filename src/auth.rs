use std::fmt;

/// Bearer token sent to the jobs backend.
///
/// Wrapped so it never ends up in `Debug` output or log lines by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_trims_whitespace() {
        let token = Token::from("  secret-token\n");
        assert_eq!(token.as_str(), "secret-token");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::from("secret-token");
        assert_eq!(format!("{token:?}"), "Token(***)");
    }
}
