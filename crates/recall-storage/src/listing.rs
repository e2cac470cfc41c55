//! Paginated listing shared by all provider bindings.

use crate::client::ObjectClient;
use crate::reference::RemoteObjectReference;
use crate::traits::{DownloadError, DownloadResult};
use recall_core::constants::KEY_SEPARATOR;
use recall_core::RestoreScope;
use std::collections::HashSet;

/// Drain every listing page under `prefix` and convert the real objects into
/// references.
///
/// Keys ending with the separator are pseudo-directories and are dropped.
/// Pages are accumulated in provider order and only returned once the last
/// page has been read; any failure discards what was collected so far. A real
/// object whose key cannot be mapped back to a local key is a failure too.
pub(crate) async fn list_all<C>(
    client: &C,
    scope: &RestoreScope,
    prefix: &RemoteObjectReference,
) -> DownloadResult<Vec<RemoteObjectReference>>
where
    C: ObjectClient + ?Sized,
{
    let start = std::time::Instant::now();
    let canonical_prefix = prefix.canonical_path();
    let listing_failed = |reason: String| DownloadError::ListingFailed {
        prefix: canonical_prefix.to_string(),
        reason,
    };

    let mut references = Vec::new();
    let mut seen_tokens = HashSet::new();
    let mut continuation: Option<String> = None;
    let mut pages = 0usize;
    let mut markers = 0usize;

    loop {
        let page = client
            .list_page(&scope.bucket, canonical_prefix, continuation.as_deref())
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %scope.bucket,
                    prefix = %canonical_prefix,
                    page = pages + 1,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Listing failed"
                );
                listing_failed(e.to_string())
            })?;
        pages += 1;

        for key in page.keys {
            if key.ends_with(KEY_SEPARATOR) {
                markers += 1;
                continue;
            }
            match RemoteObjectReference::from_canonical_path(scope, &key) {
                Ok(reference) => references.push(reference),
                Err(e) => {
                    tracing::error!(
                        key = %key,
                        error = %e,
                        bucket = %scope.bucket,
                        prefix = %canonical_prefix,
                        page = pages,
                        "Listed object does not map to a local key"
                    );
                    return Err(listing_failed(format!(
                        "listed object {} has no local key: {}",
                        key, e
                    )));
                }
            }
        }

        match page.next {
            Some(token) => {
                if !seen_tokens.insert(token.clone()) {
                    tracing::error!(
                        bucket = %scope.bucket,
                        prefix = %canonical_prefix,
                        page = pages,
                        "Provider repeated a continuation token"
                    );
                    return Err(listing_failed(format!(
                        "continuation token '{}' repeated after {} pages",
                        token, pages
                    )));
                }
                continuation = Some(token);
            }
            None => break,
        }
    }

    tracing::info!(
        bucket = %scope.bucket,
        prefix = %canonical_prefix,
        pages,
        objects = references.len(),
        skipped_markers = markers,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Listing complete"
    );

    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_scope, MockObjectClient};
    use std::path::Path;

    fn node_prefix() -> RemoteObjectReference {
        RemoteObjectReference::from_local_key(&test_scope(), Path::new("")).unwrap()
    }

    #[tokio::test]
    async fn combines_all_pages_and_counts_next_page_calls() {
        let client = MockObjectClient::new().with_pages(vec![
            vec!["cluster-a/node-1/a", "cluster-a/node-1/b"],
            vec!["cluster-a/node-1/c", "cluster-a/node-1/d"],
            vec!["cluster-a/node-1/e"],
        ]);

        let listed = list_all(&client, &test_scope(), &node_prefix()).await.unwrap();

        let keys: Vec<_> = listed.iter().map(|r| r.object_key().to_path_buf()).collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(keys[0], Path::new("a"));
        assert_eq!(keys[4], Path::new("e"));
        assert_eq!(MockObjectClient::calls(&client.next_page_calls), 2);
        assert_eq!(MockObjectClient::calls(&client.list_calls), 3);
    }

    #[tokio::test]
    async fn drops_directory_markers_on_every_page() {
        let client = MockObjectClient::new().with_pages(vec![
            vec!["cluster-a/node-1/data/", "cluster-a/node-1/data/1.db"],
            vec!["cluster-a/node-1/data/ks/", "cluster-a/node-1/data/ks/2.db"],
            vec!["cluster-a/node-1/empty/"],
        ]);

        let listed = list_all(&client, &test_scope(), &node_prefix()).await.unwrap();

        let canonical: Vec<_> = listed.iter().map(|r| r.canonical_path()).collect();
        assert_eq!(
            canonical,
            vec!["cluster-a/node-1/data/1.db", "cluster-a/node-1/data/ks/2.db"]
        );
    }

    #[tokio::test]
    async fn preserves_provider_order() {
        let client = MockObjectClient::new().with_pages(vec![vec![
            "cluster-a/node-1/z",
            "cluster-a/node-1/a",
            "cluster-a/node-1/m",
        ]]);

        let listed = list_all(&client, &test_scope(), &node_prefix()).await.unwrap();

        let keys: Vec<_> = listed.iter().map(|r| r.object_key().to_path_buf()).collect();
        assert_eq!(keys, vec![Path::new("z"), Path::new("a"), Path::new("m")]);
    }

    #[tokio::test]
    async fn failure_mid_pagination_returns_no_partial_list() {
        let client = MockObjectClient::new()
            .with_pages(vec![
                vec!["cluster-a/node-1/a"],
                vec!["cluster-a/node-1/b"],
                vec!["cluster-a/node-1/c"],
            ])
            .failing_list_on_page(1);

        let result = list_all(&client, &test_scope(), &node_prefix()).await;

        match result {
            Err(DownloadError::ListingFailed { prefix, reason }) => {
                assert_eq!(prefix, "cluster-a/node-1/");
                assert!(reason.contains("timed out"));
            }
            other => panic!("expected ListingFailed, got {:?}", other),
        }
        // the third page is never requested
        assert_eq!(MockObjectClient::calls(&client.list_calls), 2);
    }

    #[tokio::test]
    async fn repeated_continuation_token_aborts_listing() {
        let client = MockObjectClient::new()
            .with_pages(vec![vec!["cluster-a/node-1/a"], vec!["cluster-a/node-1/b"]])
            .with_repeating_token();

        let result = list_all(&client, &test_scope(), &node_prefix()).await;

        assert!(matches!(result, Err(DownloadError::ListingFailed { .. })));
        assert_eq!(MockObjectClient::calls(&client.list_calls), 2);
    }

    #[tokio::test]
    async fn unmappable_object_fails_whole_listing() {
        for bad in [
            "cluster-a/node-1/data//x.db",
            "cluster-a/node-1/data/a\\b.db",
            "cluster-a/node-1/data/../x.db",
        ] {
            let client = MockObjectClient::new().with_pages(vec![
                vec!["cluster-a/node-1/ok.db"],
                vec![bad, "cluster-a/node-1/after.db"],
            ]);

            let result = list_all(&client, &test_scope(), &node_prefix()).await;

            match result {
                Err(DownloadError::ListingFailed { reason, .. }) => {
                    assert!(reason.contains(bad), "{reason}");
                }
                other => panic!("expected ListingFailed for {bad}, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn result_does_not_depend_on_page_split() {
        let entries = vec![
            "cluster-a/node-1/data/",
            "cluster-a/node-1/data/ks/1.db",
            "cluster-a/node-1/data/ks/",
            "cluster-a/node-1/data/ks/2.db",
            "cluster-a/node-1/schema.cql",
            "cluster-a/node-1/empty/",
        ];
        let shapes: Vec<Vec<Vec<&str>>> = vec![
            vec![entries.clone()],
            entries.iter().map(|key| vec![*key]).collect(),
            vec![entries[..2].to_vec(), entries[2..5].to_vec(), entries[5..].to_vec()],
            vec![entries[..1].to_vec(), entries[1..].to_vec()],
        ];

        let mut results = Vec::new();
        for pages in shapes {
            let client = MockObjectClient::new().with_pages(pages);
            results.push(list_all(&client, &test_scope(), &node_prefix()).await.unwrap());
        }

        let expected: Vec<&str> = vec![
            "cluster-a/node-1/data/ks/1.db",
            "cluster-a/node-1/data/ks/2.db",
            "cluster-a/node-1/schema.cql",
        ];
        for listed in &results {
            let canonical: Vec<_> = listed.iter().map(|r| r.canonical_path()).collect();
            assert_eq!(canonical, expected);
        }
    }

    #[tokio::test]
    async fn empty_listing_is_not_an_error() {
        let client = MockObjectClient::new();
        let listed = list_all(&client, &test_scope(), &node_prefix()).await.unwrap();
        assert!(listed.is_empty());
    }
}
