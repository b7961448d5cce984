//! Directory-style metadata tree walker
//!
//! A directory listing is one child per line; a child ending in `/` is a
//! sub-tree, anything else a leaf. Leaves are emitted depth-first in listing
//! order as `(path relative to root, value)`. Any node that fails to fetch is
//! skipped along with everything below it.
//!
//! Children are resolved against their parent URL, so dot segments collapse
//! before the visited check. A child that does not resolve strictly below its
//! parent (`./`, `../`, absolute paths) is dropped.

use super::client::MetadataClient;
use reqwest::Url;
use std::collections::HashSet;

enum Node {
    Dir { url: Url, depth: usize },
    Leaf(Url),
}

/// Split a directory listing into child segments
fn segments(listing: &str) -> impl Iterator<Item = &str> {
    listing
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
}

/// Resolve `segment` against a directory URL, keeping only proper descendants
fn child_of(parent: &Url, segment: &str) -> Option<Url> {
    let child = parent.join(segment).ok()?;
    let below = child.as_str().len() > parent.as_str().len()
        && child.as_str().starts_with(parent.as_str());
    if !below {
        tracing::debug!("Ignoring listing entry {:?} under {}", segment, parent);
        return None;
    }
    Some(child)
}

/// Walk the tree under `root`, calling `emit` for each leaf.
///
/// `max_depth` bounds how many directory levels below `root` are entered;
/// `None` walks everything. Returns the number of leaves emitted.
pub async fn walk<F>(
    client: &MetadataClient,
    root: &str,
    max_depth: Option<usize>,
    mut emit: F,
) -> usize
where
    F: FnMut(String, String),
{
    let root = if root.ends_with('/') {
        root.to_string()
    } else {
        format!("{}/", root)
    };
    let root = match Url::parse(&root) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Invalid metadata root {}: {}", root, e);
            return 0;
        }
    };

    let mut visited = HashSet::new();
    let mut stack = vec![Node::Dir {
        url: root.clone(),
        depth: 0,
    }];
    let mut emitted = 0;

    while let Some(node) = stack.pop() {
        match node {
            Node::Dir { url, depth } => {
                if !visited.insert(url.clone()) {
                    continue;
                }

                let listing = match client.fetch(url.as_str()).await {
                    Ok(listing) => listing,
                    Err(e) => {
                        tracing::debug!("Skipping sub-tree: {}", e);
                        continue;
                    }
                };

                // Reversed so the first child is popped first
                let children: Vec<Node> = segments(&listing)
                    .filter_map(|segment| {
                        let child = child_of(&url, segment)?;
                        if !segment.ends_with('/') {
                            return Some(Node::Leaf(child));
                        }
                        match max_depth {
                            Some(max) if depth >= max => {
                                tracing::debug!("Not descending into {} (max depth)", child);
                                None
                            }
                            _ => Some(Node::Dir {
                                url: child,
                                depth: depth + 1,
                            }),
                        }
                    })
                    .collect();
                stack.extend(children.into_iter().rev());
            }
            Node::Leaf(url) => {
                if !visited.insert(url.clone()) {
                    continue;
                }

                match client.fetch(url.as_str()).await {
                    Ok(value) => {
                        let key = url
                            .as_str()
                            .strip_prefix(root.as_str())
                            .unwrap_or(url.as_str())
                            .to_string();
                        emit(key, value);
                        emitted += 1;
                    }
                    Err(e) => tracing::debug!("Skipping leaf: {}", e),
                }
            }
        }
    }

    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(server: &MockServer, at: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn run(server: &MockServer, max_depth: Option<usize>) -> Vec<(String, String)> {
        let client = MetadataClient::aws(Duration::from_secs(5)).unwrap();
        let root = format!("{}/meta/", server.uri());
        let mut pairs = Vec::new();
        walk(&client, &root, max_depth, |k, v| pairs.push((k, v))).await;
        pairs
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_synthetic_tree() {
        let server = MockServer::start().await;
        serve(&server, "/meta/", 200, "a/\nc").await;
        serve(&server, "/meta/a/", 200, "b").await;
        serve(&server, "/meta/a/b", 200, "v1").await;
        serve(&server, "/meta/c", 200, "v2").await;

        assert_eq!(run(&server, None).await, pairs(&[("a/b", "v1"), ("c", "v2")]));
    }

    #[tokio::test]
    async fn test_erroring_subtree_emits_nothing() {
        let server = MockServer::start().await;
        serve(&server, "/meta/", 200, "a/\nc").await;
        serve(&server, "/meta/a/", 500, "").await;
        serve(&server, "/meta/c", 200, "v2").await;

        assert_eq!(run(&server, None).await, pairs(&[("c", "v2")]));
    }

    #[tokio::test]
    async fn test_failed_leaf_is_skipped() {
        let server = MockServer::start().await;
        serve(&server, "/meta/", 200, "x\ny").await;
        serve(&server, "/meta/x", 404, "").await;
        serve(&server, "/meta/y", 200, "ok").await;

        assert_eq!(run(&server, None).await, pairs(&[("y", "ok")]));
    }

    #[tokio::test]
    async fn test_depth_first_order_is_listing_order() {
        let server = MockServer::start().await;
        serve(&server, "/meta/", 200, "first\nnested/\nlast\r\n").await;
        serve(&server, "/meta/first", 200, "1").await;
        serve(&server, "/meta/nested/", 200, "deep/\ninner").await;
        serve(&server, "/meta/nested/deep/", 200, "leaf").await;
        serve(&server, "/meta/nested/deep/leaf", 200, "2").await;
        serve(&server, "/meta/nested/inner", 200, "3").await;
        serve(&server, "/meta/last", 200, "4").await;

        assert_eq!(
            run(&server, None).await,
            pairs(&[
                ("first", "1"),
                ("nested/deep/leaf", "2"),
                ("nested/inner", "3"),
                ("last", "4"),
            ])
        );
    }

    #[tokio::test]
    async fn test_max_depth_limits_descent() {
        let server = MockServer::start().await;
        serve(&server, "/meta/", 200, "a/\nc").await;
        serve(&server, "/meta/a/", 200, "b").await;
        serve(&server, "/meta/a/b", 200, "v1").await;
        serve(&server, "/meta/c", 200, "v2").await;

        assert_eq!(run(&server, Some(0)).await, pairs(&[("c", "v2")]));
        assert_eq!(run(&server, Some(1)).await.len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_entries_are_visited_once() {
        let server = MockServer::start().await;
        serve(&server, "/meta/", 200, "a/\na/\nc\nc").await;
        serve(&server, "/meta/a/", 200, "b").await;
        serve(&server, "/meta/a/b", 200, "v1").await;
        serve(&server, "/meta/c", 200, "v2").await;

        assert_eq!(run(&server, None).await, pairs(&[("a/b", "v1"), ("c", "v2")]));
    }

    #[tokio::test]
    async fn test_unreachable_root_emits_nothing() {
        let client = MetadataClient::aws(Duration::from_millis(300)).unwrap();
        let count = walk(&client, "http://127.0.0.1:9/meta/", None, |_, _| {}).await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_dot_segments_are_not_followed() {
        let server = MockServer::start().await;
        serve(&server, "/meta/", 200, "./\n../\n/meta/\nc").await;
        serve(&server, "/meta/c", 200, "v2").await;

        let client = MetadataClient::aws(Duration::from_secs(5)).unwrap();
        let root = format!("{}/meta/", server.uri());
        let mut pairs = Vec::new();
        let walked = tokio::time::timeout(
            Duration::from_secs(5),
            walk(&client, &root, None, |k, v| pairs.push((k, v))),
        )
        .await;

        assert_eq!(walked.unwrap(), 1);
        assert_eq!(pairs, vec![("c".to_string(), "v2".to_string())]);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[tokio::test]
    async fn test_dotted_child_collapses_onto_visited_node() {
        let server = MockServer::start().await;
        serve(&server, "/meta/", 200, "a/\na/./\na/b/../").await;
        serve(&server, "/meta/a/", 200, "x").await;
        serve(&server, "/meta/a/x", 200, "1").await;

        assert_eq!(run(&server, None).await, pairs(&[("a/x", "1")]));
    }

    #[test]
    fn test_child_of_keeps_only_descendants() {
        let parent = Url::parse("http://169.254.169.254/latest/meta-data/").unwrap();
        assert_eq!(
            child_of(&parent, "iam/").unwrap().as_str(),
            "http://169.254.169.254/latest/meta-data/iam/"
        );
        assert!(child_of(&parent, "./").is_none());
        assert!(child_of(&parent, "../").is_none());
        assert!(child_of(&parent, "/latest/").is_none());
        assert!(child_of(&parent, "http://evil.example/").is_none());
    }
}
