// 🌐 Remote Source Adapter - Read and write the mock quote endpoint
//
// The endpoint is a public mock API (JSONPlaceholder) standing in for a
// real quote server. Reads map the post `title` field onto quote text
// under a fixed "General" category; writes are echoed back by the mock
// and never persisted, so the response is only logged.

use crate::quote::Quote;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Default collection endpoint.
const DEFAULT_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Env var overriding the endpoint.
const URL_ENV_VAR: &str = "QUOTEBOOK_REMOTE_URL";

/// Only the first entries of the remote collection are consumed.
const FETCH_LIMIT: usize = 5;

/// Category assigned to every remote quote.
const REMOTE_CATEGORY: &str = "General";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode server response: {0}")]
    Decode(#[from] serde_json::Error),
}

// ============================================================================
// WIRE SHAPE
// ============================================================================

/// The external item shape: only the title-like field matters, remaining
/// fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePost {
    pub title: String,
}

/// Map the external shape into quotes: first `limit` entries, title as
/// text, fixed category.
fn map_posts(posts: Vec<RemotePost>, limit: usize) -> Vec<Quote> {
    posts
        .into_iter()
        .take(limit)
        .map(|post| Quote::new(post.title, REMOTE_CATEGORY))
        .collect()
}

// ============================================================================
// REMOTE SOURCE
// ============================================================================

#[derive(Debug, Clone)]
pub struct RemoteSource {
    base_url: String,
    fetch_limit: usize,
    client: Client,
}

impl RemoteSource {
    /// Create from environment, falling back to the default endpoint.
    pub fn from_env() -> Self {
        let base_url = std::env::var(URL_ENV_VAR).unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        RemoteSource {
            base_url: base_url.into(),
            fetch_limit: FETCH_LIMIT,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Read the remote collection.
    ///
    /// Decodes a JSON array of posts and maps the first few into quotes.
    /// Both transport and decode failures are reported to the caller,
    /// which treats them as "no update this cycle".
    pub async fn fetch_quotes(&self) -> Result<Vec<Quote>, RemoteError> {
        tracing::debug!("fetching latest quotes from {}", self.base_url);

        let body = self
            .client
            .get(&self.base_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let posts: Vec<RemotePost> = serde_json::from_str(&body)?;
        Ok(map_posts(posts, self.fetch_limit))
    }

    /// Write one quote to the endpoint.
    ///
    /// The mock service echoes the body without persisting it, so the
    /// response never mutates local state. The quote was already saved
    /// locally before this is attempted; failures here are the caller's
    /// to log and ignore.
    pub async fn push_quote(&self, quote: &Quote) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(quote)
            .send()
            .await?
            .error_for_status()?;

        let echo = response.text().await?;
        tracing::debug!("pushed quote, server echoed: {echo}");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn posts(titles: &[&str]) -> Vec<RemotePost> {
        titles
            .iter()
            .map(|t| RemotePost {
                title: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_map_posts_takes_first_five_as_general() {
        let input = posts(&["a", "b", "c", "d", "e", "f", "g"]);

        let quotes = map_posts(input, FETCH_LIMIT);

        assert_eq!(quotes.len(), 5);
        assert_eq!(quotes[0].text, "a");
        assert_eq!(quotes[4].text, "e");
        assert!(quotes.iter().all(|q| q.category == REMOTE_CATEGORY));
    }

    #[test]
    fn test_map_posts_short_batch() {
        let quotes = map_posts(posts(&["only one"]), FETCH_LIMIT);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0], Quote::new("only one", "General"));

        assert!(map_posts(vec![], FETCH_LIMIT).is_empty());
    }

    #[test]
    fn test_decode_error_on_malformed_body() {
        let result: Result<Vec<RemotePost>, serde_json::Error> =
            serde_json::from_str("{\"not\": \"an array\"}");
        let err = RemoteError::from(result.unwrap_err());

        assert!(matches!(err, RemoteError::Decode(_)));
    }

    #[test]
    fn test_new_uses_given_url() {
        let source = RemoteSource::new("http://localhost:9999/posts");
        assert_eq!(source.base_url(), "http://localhost:9999/posts");
    }
}
