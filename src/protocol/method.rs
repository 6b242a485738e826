//! Module `method`
//!
//! Request methods the dispatcher knows how to route.

use std::fmt;

/// Request method, closed over what the save protocol handles.
///
/// Anything else is carried verbatim in `Unsupported` so it can be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Put,
    Options,
    Unsupported(String),
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Head => write!(f, "HEAD"),
            Method::Put => write!(f, "PUT"),
            Method::Options => write!(f, "OPTIONS"),
            Method::Unsupported(m) => write!(f, "{}", m),
        }
    }
}

/// Parses a method token. Methods are case-sensitive.
pub fn parse_method(raw: &str) -> Method {
    match raw.trim() {
        "GET" => Method::Get,
        "HEAD" => Method::Head,
        "PUT" => Method::Put,
        "OPTIONS" => Method::Options,
        other => Method::Unsupported(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_methods() {
        assert_eq!(parse_method("GET"), Method::Get);
        assert_eq!(parse_method("HEAD"), Method::Head);
        assert_eq!(parse_method("PUT"), Method::Put);
        assert_eq!(parse_method("OPTIONS"), Method::Options);
    }

    #[test]
    fn test_unsupported_methods() {
        assert_eq!(parse_method("POST"), Method::Unsupported("POST".to_string()));
        assert_eq!(parse_method("get"), Method::Unsupported("get".to_string()));
        assert_eq!(parse_method("DELETE").to_string(), "DELETE");
    }
}
