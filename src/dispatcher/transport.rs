use std::time::Duration;

use async_trait::async_trait;

use super::RequestError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:95.0) Gecko/20100101 Firefox/95.0";

/// Issues a single GET and returns its status once the body has been fully
/// read.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<u16, RequestError>;
}

#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    pub pool_size: usize,
    pub timeout: Duration,
    pub follow_redirects: bool,
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpTransportConfig) -> Result<Self, reqwest::Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );

        let redirect_policy = if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(redirect_policy)
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_size.max(1))
            .http1_only()
            .no_proxy()
            .danger_accept_invalid_hostnames(true)
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<u16, RequestError> {
        let resp = self.client.get(url).send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        // drain so the connection goes back to the pool
        resp.bytes().await.map_err(classify)?;
        Ok(status)
    }
}

fn classify(e: reqwest::Error) -> RequestError {
    if e.is_timeout() {
        RequestError::Timeout {
            cause: e.to_string(),
        }
    } else if e.is_builder() {
        RequestError::InvalidUrl {
            cause: e.to_string(),
        }
    } else {
        RequestError::Transport {
            cause: e.to_string(),
        }
    }
}
