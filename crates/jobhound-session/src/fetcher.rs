use crate::error::{Result, SessionError};
use crate::identity::BrowserIdentity;
use std::time::Duration;

/// How a page should be rendered before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Plain HTTP GET, no JavaScript execution
    Http,
    /// Headless Chromium DOM dump for JavaScript-heavy sites
    Browser,
}

/// Fetches a page body for a given identity.
///
/// Implementations are the heavyweight half of a fetch context; the
/// session manager decides when one may exist and which identity it
/// presents.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, identity: &BrowserIdentity) -> Result<String>;
}

/// Phrases that indicate an anti-bot challenge rather than real content.
const BLOCK_MARKERS: [&str; 6] = [
    "recaptcha",
    "g-recaptcha",
    "hcaptcha",
    "cf-challenge",
    "are you a robot",
    "unusual traffic",
];

/// Check a response body for anti-bot challenge markers.
#[must_use]
pub fn detect_block_markers(html: &str) -> Option<&'static str> {
    let lower = html.to_lowercase();
    BLOCK_MARKERS.iter().find(|m| lower.contains(**m)).copied()
}

/// Extract the origin host from a URL.
pub fn extract_origin(url: &str) -> Result<String> {
    let parsed =
        url::Url::parse(url).map_err(|e| SessionError::InvalidUrl(format!("{url}: {e}")))?;

    parsed
        .host_str()
        .ok_or_else(|| SessionError::InvalidUrl(format!("no host in URL: {url}")))
        .map(ToString::to_string)
}

/// HTTP fetcher backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Connection(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, identity: &BrowserIdentity) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &identity.user_agent)
            .header(reqwest::header::ACCEPT_LANGUAGE, &identity.accept_language)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SessionError::Timeout(url.to_string())
                } else {
                    SessionError::Connection(format!("{url}: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| SessionError::Connection(format!("{url}: {e}")))
    }
}

/// Headless Chromium fetcher using `--dump-dom`.
///
/// Each call launches a fresh process with a throwaway profile, so the
/// identity's user agent and viewport are applied via CLI flags. The
/// binary is resolved from `CHROME_BIN`, defaulting to `chromium`.
pub struct ChromeFetcher {
    timeout: Duration,
    headless: bool,
}

impl ChromeFetcher {
    #[must_use]
    pub fn new(timeout: Duration, headless: bool) -> Self {
        Self { timeout, headless }
    }
}

#[async_trait::async_trait]
impl PageFetcher for ChromeFetcher {
    async fn fetch(&self, url: &str, identity: &BrowserIdentity) -> Result<String> {
        let parsed =
            url::Url::parse(url).map_err(|e| SessionError::InvalidUrl(format!("{url}: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(SessionError::InvalidUrl(format!(
                "only http/https URLs are allowed, got: {}",
                parsed.scheme()
            )));
        }

        let chrome_bin = std::env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".to_string());
        let tmp_dir = tempfile::tempdir()
            .map_err(|e| SessionError::Browser(format!("temp profile dir: {e}")))?;

        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            format!("--user-data-dir={}", tmp_dir.path().display()),
            format!("--user-agent={}", identity.user_agent),
            format!(
                "--window-size={},{}",
                identity.viewport_width, identity.viewport_height
            ),
            "--dump-dom".to_string(),
            url.to_string(),
        ];
        if self.headless {
            args.insert(0, "--headless".to_string());
        }

        let result = tokio::time::timeout(
            self.timeout,
            tokio::process::Command::new(&chrome_bin).args(&args).output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(SessionError::Browser(format!(
                        "chromium exited with error for {url}: {stderr}"
                    )));
                }
                if output.stdout.is_empty() {
                    return Err(SessionError::Browser(format!("empty DOM output for {url}")));
                }
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Err(e)) => Err(SessionError::Browser(format!(
                "failed to launch chromium for {url}: {e}"
            ))),
            Err(_) => Err(SessionError::Timeout(url.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_origin() {
        assert_eq!(
            extract_origin("https://remoteok.com/remote-rust-jobs").expect("parse URL"),
            "remoteok.com"
        );
        assert_eq!(
            extract_origin("http://sub.example.com:8080/path").expect("parse URL"),
            "sub.example.com"
        );
    }

    #[test]
    fn test_extract_origin_invalid() {
        assert!(extract_origin("not-a-url").is_err());
    }

    #[test]
    fn test_block_marker_detection() {
        assert_eq!(
            detect_block_markers("<div class=\"g-recaptcha\"></div>"),
            Some("recaptcha")
        );
        assert_eq!(
            detect_block_markers("<p>Are You A Robot?</p>"),
            Some("are you a robot")
        );
        assert_eq!(detect_block_markers("<ul><li>Rust Engineer</li></ul>"), None);
    }
}
