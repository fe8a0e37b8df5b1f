//! Named API endpoints.

/// Known control-plane endpoints by short name.
const ENDPOINTS: &[(&str, &str)] = &[
    ("ovh-eu", "https://eu.api.ovh.com/1.0"),
    ("ovh-ca", "https://ca.api.ovh.com/1.0"),
    ("ovh-us", "https://api.us.ovhcloud.com/1.0"),
    ("kimsufi-eu", "https://eu.api.kimsufi.com/1.0"),
    ("kimsufi-ca", "https://ca.api.kimsufi.com/1.0"),
    ("soyoustart-eu", "https://eu.api.soyoustart.com/1.0"),
    ("soyoustart-ca", "https://ca.api.soyoustart.com/1.0"),
];

/// Endpoint name that is neither known nor a URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown endpoint `{0}` (expected one of {list} or an http(s) URL)", list = known_list())]
pub struct UnknownEndpoint(pub String);

fn known_list() -> String {
    names().collect::<Vec<_>>().join(", ")
}

/// Names of the built-in endpoints.
pub fn names() -> impl Iterator<Item = &'static str> {
    ENDPOINTS.iter().map(|(name, _)| *name)
}

/// Resolve a short endpoint name or an explicit URL to a base URL.
///
/// Trailing slashes are removed so paths can be appended directly.
pub fn resolve(endpoint: &str) -> Result<String, UnknownEndpoint> {
    let endpoint = endpoint.trim();
    if let Some((_, url)) = ENDPOINTS.iter().find(|(name, _)| *name == endpoint) {
        return Ok((*url).to_string());
    }
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        return Ok(endpoint.trim_end_matches('/').to_string());
    }
    Err(UnknownEndpoint(endpoint.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_named() {
        assert_eq!(resolve("ovh-eu").unwrap(), "https://eu.api.ovh.com/1.0");
        assert_eq!(resolve("ovh-us").unwrap(), "https://api.us.ovhcloud.com/1.0");
        assert_eq!(resolve(" ovh-ca ").unwrap(), "https://ca.api.ovh.com/1.0");
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve("http://localhost:8080/1.0/").unwrap(),
            "http://localhost:8080/1.0"
        );
    }

    #[test]
    fn test_resolve_unknown() {
        let err = resolve("mars-1").unwrap_err();
        assert_eq!(err, UnknownEndpoint("mars-1".to_string()));
        assert!(err.to_string().contains("ovh-eu"));
    }
}
