use std::time::Instant;

use importer_config::ImporterConfig;
use reqwest::{Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ImportClientError, Result};

/// Builds the client used for both the upload and the progress stream.
///
/// Only a connect timeout is set here; the upload applies its own whole-request timeout and
/// the progress stream is long lived.
pub fn build_http_client(config: &ImporterConfig) -> Result<ClientWithMiddleware> {
    let reqwest_client = reqwest::Client::builder()
        .connect_timeout(config.client.connect_timeout)
        .user_agent(config.client.user_agent.clone())
        .build()?;
    Ok(ClientBuilder::new(reqwest_client).with(RequestLoggingMiddleware).build())
}

/// `endpoint` with the segments of `path` appended, so a base path on the endpoint
/// (e.g. `https://gw.example.com/importer`) is kept.
pub(crate) fn endpoint_url(endpoint: &str, path: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint)?;
    url.path_segments_mut()
        .map_err(|_| ImportClientError::ConfigurationError(format!("endpoint {endpoint} cannot carry a path")))?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// Logs each outbound request with its status and elapsed time.
pub struct RequestLoggingMiddleware;

#[async_trait::async_trait]
impl Middleware for RequestLoggingMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        debug!(%method, %url, "sending request");

        let start = Instant::now();
        let result = next.run(req, extensions).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(response) if response.status().is_success() => {
                info!(%method, %url, status = response.status().as_u16(), elapsed_ms, "request completed");
            },
            Ok(response) => {
                warn!(%method, %url, status = response.status().as_u16(), elapsed_ms, "request rejected");
            },
            Err(e) => {
                warn!(%method, %url, elapsed_ms, error = %e, "request failed");
            },
        }
        result
    }
}
