//! Candidate JSON listing endpoints, tried in order until one carries a chapter list.

use super::{Discovered, find_chapter_array, stubs_from_entries};
use crate::config::EngineConfig;
use crate::fetch::{Fetch, fetch_ok};
use crate::formats::DiscoveryMethod;

pub fn discover(fetcher: &dyn Fetch, config: &EngineConfig, book_id: &str) -> Vec<Discovered> {
    for url in config.listing_endpoints(book_id) {
        let Some(body) = fetch_ok(fetcher, &url) else {
            continue;
        };
        let value: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(%url, %err, "endpoint did not return json");
                continue;
            }
        };
        let Some(items) = find_chapter_array(&value) else {
            continue;
        };
        let stubs = stubs_from_entries(items, config, book_id, DiscoveryMethod::EndpointProbe);
        if !stubs.is_empty() {
            tracing::debug!(%url, entries = stubs.len(), "endpoint returned a chapter list");
            return stubs;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MapFetcher;

    fn config() -> EngineConfig {
        EngineConfig {
            base_url: "http://site.test".to_owned(),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn first_endpoint_with_a_chapter_list_wins() {
        let site = MapFetcher::new()
            .with("http://site.test/api/book/B/contents", "<html>login required</html>")
            .with("http://site.test/api/book/B/catalog", r#"{"code": 0, "data": []}"#)
            .with(
                "http://site.test/api/ancientlib/book/B/chapters",
                r#"{"code": 0, "data": {"list": [{"id": "e1", "title": "卷之三"}, {"id": "e2", "title": "卷之四"}]}}"#,
            )
            .with(
                "http://site.test/api/v1/book/B/chapters",
                r#"[{"id": "late", "title": "never reached"}]"#,
            );

        let found = discover(&site, &config(), "B");
        let ids: Vec<&str> = found.iter().map(|d| d.stub.identifier.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
        assert!(found.iter().all(|d| d.stub.discovery_method == DiscoveryMethod::EndpointProbe));
        assert!(found[0].stub.is_volume);
        assert!(!site.requested("http://site.test/api/v1/book/B/chapters"));
    }

    #[test]
    fn no_endpoint_yields_nothing() {
        let site = MapFetcher::new();
        assert!(discover(&site, &config(), "B").is_empty());
        assert_eq!(site.requests.borrow().len(), config().listing_endpoints("B").len());
    }
}
