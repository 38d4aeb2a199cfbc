use thiserror::Error;

/// Failure classes for a single data-source call.
///
/// `Transient` failures (connect, timeout, 5xx) are eligible for retry.
/// `Terminal` failures are not: the source is signalling that the request
/// can never succeed, and retrying would only burn the retry budget.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transient fetch failure: {0}")]
    Transient(String),

    #[error("terminal fetch failure: {0}")]
    Terminal(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        FetchError::Transient(msg.into())
    }

    pub fn terminal(msg: impl Into<String>) -> Self {
        FetchError::Terminal(msg.into())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        // Malformed requests and 4xx responses fail the same way every time.
        let terminal = e.is_builder()
            || e.is_decode()
            || e.status().is_some_and(|s| s.is_client_error());
        if terminal {
            FetchError::Terminal(e.to_string())
        } else {
            FetchError::Transient(e.to_string())
        }
    }
}

/// LLM synthesis failure. Always recovered locally via the deterministic
/// fallback template; never surfaced to the caller of the pipeline.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("LLM backend error: {0}")]
    Backend(String),

    #[error("LLM call timed out after {0}s")]
    Timeout(u64),

    #[error("no LLM backend configured")]
    NoBackend,
}

/// The single hard failure of the query pipeline: candidate extraction
/// produced nothing to rank. Every other failure degrades into warnings.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no candidate diseases could be extracted: {0}")]
    NoCandidates(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let e = FetchError::transient("connection reset");
        assert!(e.is_transient());
        let e = FetchError::terminal("unsupported disease");
        assert!(!e.is_transient());
    }

    #[test]
    fn test_error_messages_name_the_class() {
        let e = FetchError::transient("timeout");
        assert!(e.to_string().contains("transient"));
        let e = PipelineError::NoCandidates("empty question".into());
        assert!(e.to_string().contains("no candidate"));
    }
}
