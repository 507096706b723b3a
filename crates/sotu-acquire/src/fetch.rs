use async_trait::async_trait;
use sotu_model::FetchError;
use std::time::Duration;

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; SOTUScraper/1.0)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Anything that can hand back the HTML of a page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP page fetcher with a bounded timeout and a courtesy delay.
///
/// Every call to [`PageSource::fetch`] sleeps for `delay` after the request
/// finishes, whether it succeeded or not, so back-to-back calls never hit the
/// site more often than once per `delay`.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    delay: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, delay: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            timeout,
            delay,
        })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| self.classify(url, e))
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!(url = %url, "GET");
        let result = self.get(url).await;
        match &result {
            Ok(body) => tracing::debug!(url = %url, bytes = body.len(), "Received HTML"),
            Err(e) => tracing::debug!(url = %url, error = %e, "Fetch failed"),
        }
        tokio::time::sleep(self.delay).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `response` verbatim to every connection; returns the base URL.
    async fn serve(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    /// Accept connections and never answer.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}")
    }

    const OK_RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Content-Length: 26\r\n\
        Connection: close\r\n\r\n\
        <html><p>speech</p></html>";

    const NOT_FOUND_RESPONSE: &str = "HTTP/1.1 404 Not Found\r\n\
        Content-Length: 0\r\n\
        Connection: close\r\n\r\n";

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let base = serve(OK_RESPONSE).await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5), Duration::ZERO).unwrap();
        let body = fetcher.fetch(&format!("{base}/speech")).await.unwrap();
        assert_eq!(body, "<html><p>speech</p></html>");
    }

    #[tokio::test]
    async fn test_fetch_404_is_status_error() {
        let base = serve(NOT_FOUND_RESPONSE).await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5), Duration::ZERO).unwrap();
        let url = format!("{base}/missing");
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert_eq!(err, FetchError::Status { url, status: 404 });
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let base = serve_silence().await;
        let fetcher = HttpFetcher::new(Duration::from_millis(200), Duration::ZERO).unwrap();
        let err = fetcher.fetch(&format!("{base}/slow")).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        // Bind then drop to get a port nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(Duration::from_secs(5), Duration::ZERO).unwrap();
        let err = fetcher.fetch(&format!("http://{addr}/")).await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_consecutive_fetches_respect_delay() {
        let base = serve(OK_RESPONSE).await;
        let delay = Duration::from_millis(150);
        let fetcher = HttpFetcher::new(Duration::from_secs(5), delay).unwrap();

        let start = Instant::now();
        fetcher.fetch(&format!("{base}/a")).await.unwrap();
        let first_done = Instant::now();
        fetcher.fetch(&format!("{base}/b")).await.unwrap();

        assert!(first_done - start >= delay);
        assert!(start.elapsed() >= delay * 2);
    }

    #[tokio::test]
    async fn test_delay_applies_after_failure() {
        let base = serve(NOT_FOUND_RESPONSE).await;
        let delay = Duration::from_millis(150);
        let fetcher = HttpFetcher::new(Duration::from_secs(5), delay).unwrap();

        let start = Instant::now();
        assert!(fetcher.fetch(&format!("{base}/gone")).await.is_err());
        assert!(start.elapsed() >= delay);
    }
}
