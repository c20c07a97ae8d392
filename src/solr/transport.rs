use super::query::SolrQuery;
use super::response::SolrResponse;
use crate::error::{Result, ViewerError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Executes a built query against the backend
#[async_trait]
pub trait SolrTransport: Send + Sync {
    async fn execute(&self, query: &SolrQuery) -> Result<SolrResponse>;
}

#[derive(Clone)]
pub struct HttpTransport {
    select_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// `select_url` is the full `.../<collection>/select` endpoint
    pub fn new(select_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ViewerError::Transport {
            url: select_url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            select_url: select_url.to_string(),
            client,
        })
    }

    pub fn select_url(&self) -> &str {
        &self.select_url
    }

    fn map_error(&self, err: reqwest::Error) -> ViewerError {
        if err.is_timeout() {
            ViewerError::Timeout {
                url: self.select_url.clone(),
            }
        } else {
            ViewerError::Transport {
                url: self.select_url.clone(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl SolrTransport for HttpTransport {
    async fn execute(&self, query: &SolrQuery) -> Result<SolrResponse> {
        let params = query.to_params();
        debug!(target: "solr", "GET {} {:?}", self.select_url, params);

        let response = self
            .client
            .get(&self.select_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        if !status.is_success() {
            warn!(target: "solr", "Backend answered {} for q={}", status, query.q);
            return Err(ViewerError::Transport {
                url: self.select_url.clone(),
                message: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        let decoded = SolrResponse::from_json(&body)?;
        debug!(
            target: "solr",
            "numFound={} docs={}",
            decoded.response.num_found,
            decoded.response.docs.len()
        );
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_keeps_url() {
        let transport = HttpTransport::new(
            "http://localhost:8983/solrService/collection1/select",
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert!(transport.select_url().ends_with("/collection1/select"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 9 (discard) is not expected to run an HTTP server
        let transport =
            HttpTransport::new("http://127.0.0.1:9/solr/select", Some(Duration::from_secs(2)))
                .unwrap();
        let err = transport
            .execute(&crate::solr::query::schemas_query())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ViewerError::Transport { .. } | ViewerError::Timeout { .. }
        ));
    }

    #[tokio::test]
    async fn test_silent_backend_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept and hold the connection without ever answering
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let transport = HttpTransport::new(
            &format!("http://{}/solr/collection1/select", addr),
            Some(Duration::from_millis(200)),
        )
        .unwrap();
        let err = transport
            .execute(&crate::solr::query::schemas_query())
            .await
            .unwrap_err();
        server.abort();

        assert!(matches!(err, ViewerError::Timeout { .. }), "got {:?}", err);
    }
}
