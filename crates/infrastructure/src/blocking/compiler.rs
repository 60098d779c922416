//! Loads blacklist/whitelist sources (`Blocking.BlackLists`/`WhiteLists`:
//! `group -> [sources]`) from local files or `http(s)://` URLs into plain
//! domain lists: no database, no per-source bit assignment.

use std::collections::HashMap;
use std::time::Duration;

use ferrous_resolver_domain::ResolverError;
use tracing::{debug, warn};

/// Persistent HTTP client reused across reloads.
pub struct ListSourceFetcher {
    http: reqwest::Client,
}

impl ListSourceFetcher {
    pub fn new() -> Result<Self, ResolverError> {
        let http = reqwest::Client::builder()
            .user_agent("ferrous-resolver/blocklist-sync")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ResolverError::Config(format!("building blocklist HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Fetches every source for every group and returns the compiled
    /// `group -> [domain, ...]` map. A single unreachable source is logged
    /// and skipped rather than failing the whole reload.
    pub async fn compile(&self, sources: &HashMap<String, Vec<String>>) -> HashMap<String, Vec<String>> {
        let mut out = HashMap::with_capacity(sources.len());
        for (group, group_sources) in sources {
            let mut domains = Vec::new();
            for source in group_sources {
                match self.fetch(source).await {
                    Ok(text) => domains.extend(parse_list(&text)),
                    Err(e) => warn!(group, source, error = %e, "failed to load blocklist source"),
                }
            }
            debug!(group, count = domains.len(), "compiled list group");
            out.insert(group.clone(), domains);
        }
        out
    }

    async fn fetch(&self, source: &str) -> Result<String, ResolverError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            self.http
                .get(source)
                .send()
                .await
                .map_err(|e| ResolverError::DialFailed(e.to_string()))?
                .text()
                .await
                .map_err(|e| ResolverError::DialFailed(e.to_string()))
        } else {
            tokio::fs::read_to_string(source)
                .await
                .map_err(|e| ResolverError::Config(format!("{source}: {e}")))
        }
    }
}

/// Parses one list document: blank lines and `#`-comments are skipped;
/// hosts-file lines (`0.0.0.0 ads.example`) take the second token, plain
/// lines take the first. Inline trailing comments are stripped.
fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                return None;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let domain = match tokens.as_slice() {
                [ip, domain] if ip.parse::<std::net::IpAddr>().is_ok() => *domain,
                [domain] => *domain,
                _ => return None,
            };
            let domain = domain.trim_end_matches('.');
            if domain.is_empty() {
                None
            } else {
                Some(domain.to_ascii_lowercase())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_hosts_style_lines() {
        let text = "# comment\nads.example\n0.0.0.0 tracker.example\n\n127.0.0.1 localhost\n";
        let domains = parse_list(text);
        assert_eq!(domains, vec!["ads.example", "tracker.example", "localhost"]);
    }

    #[test]
    fn strips_inline_comments_and_trailing_dot() {
        let text = "ads.example. # blocked for kids\n";
        assert_eq!(parse_list(text), vec!["ads.example"]);
    }
}
