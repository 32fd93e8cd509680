use super::types::ScoutError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl ScoutError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        let (error_type, retryable) = match self {
            // Retryable errors
            ScoutError::RateLimit(_) => ("RateLimitError", true),
            ScoutError::Network(_) => ("NetworkError", true),
            ScoutError::Timeout(_) => ("TimeoutError", true),
            ScoutError::LLMApi(_) => ("LLMApiError", true),
            ScoutError::Browser(_) => ("BrowserError", true),
            ScoutError::Io(_) => ("IoError", true),

            // Non-retryable errors
            ScoutError::Authentication(_) => ("AuthenticationError", false),
            ScoutError::Config(_) => ("ConfigError", false),
            ScoutError::InvalidAction(_) => ("InvalidActionError", false),
            ScoutError::MalformedResponse(_) => ("MalformedResponseError", false),
            ScoutError::AlreadyRunning(_) => ("AlreadyRunningError", false),
            ScoutError::JobNotFound(_) => ("JobNotFoundError", false),
            ScoutError::InvalidRequest(_) => ("InvalidRequestError", false),
            ScoutError::Json(_) => ("JsonError", false),
            ScoutError::Yaml(_) => ("YamlError", false),
            ScoutError::Internal(_) => ("InternalError", false),
        };
        ErrorClassification { error_type, retryable }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = ScoutError::RateLimit("too many requests".into());
        let class = err.classify();
        assert!(class.retryable);
        assert_eq!(class.error_type, "RateLimitError");
    }

    #[test]
    fn test_auth_error_not_retryable() {
        let err = ScoutError::Authentication("bad key".into());
        let class = err.classify();
        assert!(!class.retryable);
        assert_eq!(class.error_type, "AuthenticationError");
    }

    #[test]
    fn test_network_error_retryable() {
        assert!(ScoutError::Network("connection refused".into()).classify().retryable);
    }

    #[test]
    fn test_already_running_not_retryable() {
        assert!(!ScoutError::AlreadyRunning("alibaba".into()).classify().retryable);
    }

    #[test]
    fn test_malformed_model_output_not_retryable() {
        let class = ScoutError::MalformedResponse("no valid JSON".into()).classify();
        assert!(!class.retryable);
        assert_eq!(class.error_type, "MalformedResponseError");
        assert!(ScoutError::LLMApi("upstream overloaded".into()).classify().retryable);
    }
}
