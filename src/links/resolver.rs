use anyhow::Result;
use reqwest::redirect;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use url::Url;

const TIKTOK_MARKER: &str = "tiktok";
const TIKTOK_DOMAIN: &str = "https://www.tiktok.com";
const VX_DOMAIN: &str = "https://www.vxtiktok.com";

/// Soft deadline for the redirect race. Decides which signal to trust; does
/// not cancel the in-flight request.
const RESOLVE_DEADLINE: Duration = Duration::from_secs(5);
/// Hard bound on the underlying request, detached or not.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 10;
const USER_AGENT: &str = "vxrelay/0.1";

/// Resolves short video links to their canonical URL and rewrites the result
/// onto the embed domain.
///
/// Short-link providers return a redirect whose `Location` header is already
/// the answer, even when the destination page itself is slow or broken. The
/// resolver therefore races an early redirect signal against a fixed deadline
/// instead of waiting for the full response.
pub struct Resolver {
    marker: String,
    canonical_domain: String,
    embed_domain: String,
    soft_deadline: Duration,
}

impl Resolver {
    pub fn new() -> Self {
        Self::with_domains(TIKTOK_MARKER, TIKTOK_DOMAIN, VX_DOMAIN)
    }

    /// Parameterized constructor, used by tests to point at a local server.
    pub fn with_domains(
        marker: impl Into<String>,
        canonical_domain: impl Into<String>,
        embed_domain: impl Into<String>,
    ) -> Self {
        Self {
            marker: marker.into(),
            canonical_domain: canonical_domain.into(),
            embed_domain: embed_domain.into(),
            soft_deadline: RESOLVE_DEADLINE,
        }
    }

    /// Resolve a URL to its canonical form, query string stripped.
    ///
    /// `Ok(None)` is the expected not-applicable path: the URL is not a link
    /// of interest, or no canonical destination could be derived within the
    /// deadline. Transport errors with no recoverable state propagate.
    pub async fn resolve(&self, url: &str) -> Result<Option<String>> {
        if !url.contains(&self.marker) {
            return Ok(None);
        }

        // Already canonical: nothing to follow.
        if url.starts_with(&self.canonical_domain) {
            return Ok(Some(strip_query(url).to_string()));
        }

        let (tx, mut rx) = oneshot::channel::<Url>();
        let tx = Mutex::new(Some(tx));
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                return attempt.error("too many redirects");
            }
            if let Ok(mut slot) = tx.lock()
                && let Some(tx) = slot.take()
            {
                let _ = tx.send(attempt.url().clone());
            }
            attempt.follow()
        });
        let client = reqwest::Client::builder()
            .redirect(policy)
            .timeout(CLIENT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        let target = url.to_string();
        let request = tokio::spawn(async move { client.get(&target).send().await });

        tokio::select! {
            observed = &mut rx => match observed {
                Ok(redirect_target) => {
                    watch_detached(request);
                    Ok(self.canonical_from_path(redirect_target.path()))
                }
                // The request finished without a single redirect; inspect
                // its outcome directly.
                Err(_) => self.finish(request).await,
            },
            () = tokio::time::sleep(self.soft_deadline) => self.finish(request).await,
        }
    }

    /// Substitute the canonical domain for the embed domain.
    pub fn rewrite(&self, canonical: &str) -> String {
        canonical.replacen(&self.canonical_domain, &self.embed_domain, 1)
    }

    /// Await the full response and extract the canonical URL from the final
    /// request state.
    async fn finish(&self, request: JoinHandle<reqwest::Result<reqwest::Response>>) -> Result<Option<String>> {
        match request.await? {
            Ok(response) => {
                let final_url = response.url();
                if final_url.as_str().starts_with(&self.canonical_domain) {
                    Ok(self.canonical_from_path(final_url.path()))
                } else {
                    tracing::debug!(url = %final_url, "request completed without reaching the canonical host");
                    Ok(None)
                }
            }
            Err(err) => {
                // Redirect-exhaustion and post-redirect connection failures
                // still record the last resolved URL on the error.
                if let Some(resolved) = err.url()
                    && resolved.as_str().starts_with(&self.canonical_domain)
                {
                    return Ok(self.canonical_from_path(resolved.path()));
                }
                if err.is_timeout() {
                    tracing::debug!(error = %err, "resolve timed out");
                    return Ok(None);
                }
                Err(err.into())
            }
        }
    }

    fn canonical_from_path(&self, path: &str) -> Option<String> {
        let path = strip_query(path);
        if path.is_empty() || path == "/" {
            return None;
        }
        Some(format!("{}{path}", self.canonical_domain))
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain the superseded request in the background. Its completion is advisory
/// only; timeouts are expected once the answer has been obtained, anything
/// else is surfaced to the log.
fn watch_detached(request: JoinHandle<reqwest::Result<reqwest::Response>>) {
    tokio::spawn(async move {
        match request.await {
            Ok(Ok(_)) | Err(_) => {}
            Ok(Err(err)) if err.is_timeout() => {}
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "detached resolve request failed");
            }
        }
    });
}

/// Everything from the first `?` onward is discarded.
fn strip_query(url: &str) -> &str {
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn local_resolver(canonical: &str) -> Resolver {
        let mut resolver = Resolver::with_domains("127.0.0.1", canonical, "https://embed.example");
        resolver.soft_deadline = Duration::from_millis(300);
        resolver
    }

    /// A 200 sink so detached background requests land somewhere quiet.
    async fn canonical_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    }

    /// Port that nothing listens on.
    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);
        port
    }

    #[test]
    fn strip_query_variants() {
        assert_eq!(strip_query("/v/1?x=2"), "/v/1");
        assert_eq!(strip_query("/v/1"), "/v/1");
        assert_eq!(strip_query("?x=2"), "");
    }

    #[test]
    fn rewrite_swaps_domain_prefix() {
        let resolver = Resolver::new();
        assert_eq!(
            resolver.rewrite("https://www.tiktok.com/@user/video/555"),
            "https://www.vxtiktok.com/@user/video/555"
        );
    }

    #[tokio::test]
    async fn unrelated_url_is_not_applicable() {
        let resolver = Resolver::new();
        let result = resolver.resolve("https://example.com/watch").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn canonical_url_passes_through_without_network() {
        let resolver = Resolver::new();
        let result = resolver
            .resolve("https://www.tiktok.com/@user/video/777")
            .await
            .unwrap();
        assert_eq!(result.as_deref(), Some("https://www.tiktok.com/@user/video/777"));
    }

    #[tokio::test]
    async fn canonical_url_query_is_stripped() {
        let resolver = Resolver::new();
        let result = resolver
            .resolve("https://www.tiktok.com/@u/video/1?q=2")
            .await
            .unwrap();
        assert_eq!(result.as_deref(), Some("https://www.tiktok.com/@u/video/1"));
    }

    #[tokio::test]
    async fn early_redirect_signal_builds_canonical() {
        let canonical = canonical_server().await;
        let short = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ABC123/"))
            .respond_with(ResponseTemplate::new(302).insert_header(
                "location",
                format!("{}/@user/video/555?extra=2", canonical.uri()),
            ))
            .mount(&short)
            .await;

        let resolver = local_resolver(&canonical.uri());
        let result = resolver
            .resolve(&format!("{}/ABC123/?x=1", short.uri()))
            .await
            .unwrap();
        assert_eq!(
            result,
            Some(format!("{}/@user/video/555", canonical.uri()))
        );
    }

    #[tokio::test]
    async fn deadline_falls_back_to_final_response_url() {
        let canonical = canonical_server().await;
        let short = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/@user/video/9", canonical.uri()))
                    .set_delay(Duration::from_millis(700)),
            )
            .mount(&short)
            .await;

        let resolver = local_resolver(&canonical.uri());
        let result = resolver
            .resolve(&format!("{}/slow", short.uri()))
            .await
            .unwrap();
        assert_eq!(result, Some(format!("{}/@user/video/9", canonical.uri())));
    }

    #[tokio::test]
    async fn slow_response_off_canonical_host_is_absent() {
        let short = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dead-end"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(700)))
            .mount(&short)
            .await;

        let resolver = local_resolver("https://www.tiktok.com");
        let result = resolver
            .resolve(&format!("{}/dead-end", short.uri()))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn error_after_redirect_recovers_from_error_url() {
        // The short link redirects (after the deadline has passed) to a
        // canonical host that refuses the connection; the canonical URL is
        // recovered from the error state.
        let short = MockServer::start().await;
        let canonical_base = format!("http://127.0.0.1:{}", closed_port());
        Mock::given(method("GET"))
            .and(path("/reset"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{canonical_base}/@user/video/3"))
                    .set_delay(Duration::from_millis(700)),
            )
            .mount(&short)
            .await;

        let resolver = local_resolver(&canonical_base);
        let result = resolver
            .resolve(&format!("{}/reset", short.uri()))
            .await
            .unwrap();
        assert_eq!(result, Some(format!("{canonical_base}/@user/video/3")));
    }

    #[tokio::test]
    async fn unrecoverable_error_propagates() {
        let resolver = local_resolver("https://www.tiktok.com");
        let result = resolver
            .resolve(&format!("http://127.0.0.1:{}/gone", closed_port()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn redirect_to_root_is_absent() {
        let canonical = canonical_server().await;
        let short = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/expired"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("{}/", canonical.uri())),
            )
            .mount(&short)
            .await;

        let resolver = local_resolver(&canonical.uri());
        let result = resolver
            .resolve(&format!("{}/expired", short.uri()))
            .await
            .unwrap();
        assert_eq!(result, None);
    }
}
