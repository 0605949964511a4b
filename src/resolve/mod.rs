//! Source resolution: find a downloadable candidate for an item.
//!
//! The query is built from the item's title and artists; only the
//! top-ranked search result is used. [`YtDlpResolver`] runs a one-result
//! YouTube search through yt-dlp and turns the returned video id into a
//! watch URL.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::process::Command;

use crate::model::{Item, Locator};
use crate::pipeline::retry::Retryable;

/// Why no locator was produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The search ran and returned zero results
    #[error("No search results")]
    NotFound,

    /// yt-dlp could not be started at all
    #[error("Search tool unavailable: {0}")]
    ToolUnavailable(String),

    /// The search itself failed (tool crash, network)
    #[error("Search failed: {0}")]
    Transient(String),
}

impl Retryable for ResolveError {
    fn is_retryable(&self) -> bool {
        matches!(self, ResolveError::Transient(_))
    }
}

/// Turns a free-text query into the top-ranked content locator.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<Locator, ResolveError>;
}

/// Search query for an item.
///
/// "(Official Audio)" steers results away from music videos with intros.
pub fn search_query(item: &Item) -> String {
    format!("{} (Official Audio) - {}", item.title, item.artist_credit())
}

/// Resolver backed by `yt-dlp`'s YouTube search.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: PathBuf,
}

impl YtDlpResolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl SourceResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<Locator, ResolveError> {
        tracing::debug!("Searching for {:?}", query);

        let output = Command::new(&self.program)
            .arg("--flat-playlist")
            .arg("--no-warnings")
            .args(["--print", "id"])
            .arg(format!("ytsearch1:{}", query))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                let message = format!("Failed to run yt-dlp: {}", e);
                match e.kind() {
                    ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                        ResolveError::ToolUnavailable(message)
                    }
                    _ => ResolveError::Transient(message),
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::Transient(format!(
                "yt-dlp search failed: {}",
                stderr.trim()
            )));
        }

        parse_search_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// First non-empty line of `--print id` output as a watch URL.
fn parse_search_output(stdout: &str) -> Result<Locator, ResolveError> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|id| Locator::new(format!("https://www.youtube.com/watch?v={}", id)))
        .ok_or(ResolveError::NotFound)
}


#[cfg(test)]
mod tests {
    use super::mocks::MockResolver;
    use super::*;
    use crate::test_utils::mock_item;

    #[test]
    fn test_search_query_format() {
        let item = Item {
            artists: vec!["Daft Punk".to_string(), "Pharrell Williams".to_string()],
            ..mock_item("Get Lucky")
        };
        assert_eq!(
            search_query(&item),
            "Get Lucky (Official Audio) - Daft Punk, Pharrell Williams"
        );
    }

    #[test]
    fn test_parse_search_output() {
        let locator = parse_search_output("dQw4w9WgXcQ\n").unwrap();
        assert_eq!(locator.as_str(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_parse_search_output_skips_blank_lines() {
        let locator = parse_search_output("\n  \nabc123\nignored\n").unwrap();
        assert_eq!(locator.as_str(), "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_empty_output_is_not_found() {
        assert_eq!(parse_search_output(""), Err(ResolveError::NotFound));
        assert_eq!(parse_search_output("\n\n"), Err(ResolveError::NotFound));
    }

    #[test]
    fn test_only_transient_errors_retry() {
        assert!(!ResolveError::NotFound.is_retryable());
        assert!(ResolveError::Transient("boom".to_string()).is_retryable());
        assert!(!ResolveError::ToolUnavailable("gone".to_string()).is_retryable());
    }

    #[tokio::test]
    async fn test_missing_tool_is_terminal() {
        let resolver = YtDlpResolver::new("/definitely/not/here/yt-dlp");
        let result = resolver.resolve("anything").await;
        assert!(matches!(result, Err(ResolveError::ToolUnavailable(_))));
    }

    #[tokio::test]
    async fn test_mock_resolver_script() {
        let resolver = MockResolver::new().missing("B").flaky("C", 1);

        let query = |title: &str| search_query(&mock_item(title));
        assert_eq!(
            resolver.resolve(&query("A")).await,
            Ok(Locator::new("mock://A"))
        );
        assert_eq!(
            resolver.resolve(&query("B")).await,
            Err(ResolveError::NotFound)
        );
        assert!(matches!(
            resolver.resolve(&query("C")).await,
            Err(ResolveError::Transient(_))
        ));
        assert_eq!(
            resolver.resolve(&query("C")).await,
            Ok(Locator::new("mock://C"))
        );
    }
}
