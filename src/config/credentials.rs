use tracing::debug;

/// Resolve a credential value. If the value starts with '$', treat it as an
/// environment variable reference and resolve from the environment.
pub fn resolve_credential(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        match std::env::var(var_name) {
            Ok(resolved) => {
                debug!(var = %var_name, "Resolved credential from environment");
                resolved
            }
            Err(_) => {
                debug!(var = %var_name, "Environment variable not set, using literal");
                value.to_string()
            }
        }
    } else {
        value.to_string()
    }
}

/// Environment variable holding the API key for a provider.
pub fn provider_env_var(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" => Some("GEMINI_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    }
}

/// API key lookup order: explicit flag, config file, provider environment variable.
pub fn resolve_api_key(explicit: Option<&str>, configured: Option<&str>, provider: &str) -> Option<String> {
    explicit
        .map(|s| s.to_string())
        .or_else(|| configured.map(resolve_credential))
        .or_else(|| provider_env_var(provider).and_then(|v| std::env::var(v).ok()))
        .filter(|k| !k.is_empty())
}

/// Redact sensitive values in a string.
pub fn redact_credentials(text: &str, secrets: &[&str]) -> String {
    let mut result = text.to_string();
    for secret in secrets {
        if !secret.is_empty() && secret.len() >= 4 {
            result = result.replace(secret, "[REDACTED]");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_credential() {
        assert_eq!(resolve_credential("plain-key"), "plain-key");
    }

    #[test]
    fn test_env_credential() {
        std::env::set_var("SCOUT_TEST_CREDENTIAL", "from-env");
        assert_eq!(resolve_credential("$SCOUT_TEST_CREDENTIAL"), "from-env");
    }

    #[test]
    fn test_missing_env_keeps_literal() {
        assert_eq!(resolve_credential("$SCOUT_DEFINITELY_UNSET"), "$SCOUT_DEFINITELY_UNSET");
    }

    #[test]
    fn test_explicit_key_wins() {
        let key = resolve_api_key(Some("flag"), Some("file"), "gemini");
        assert_eq!(key.as_deref(), Some("flag"));
        let key = resolve_api_key(None, Some("file"), "gemini");
        assert_eq!(key.as_deref(), Some("file"));
    }

    #[test]
    fn test_redact() {
        let out = redact_credentials("url?key=abcd1234&q=1", &["abcd1234"]);
        assert_eq!(out, "url?key=[REDACTED]&q=1");
    }
}
