//! Remote JSON source fetched over HTTP.

use super::{DataSource, SourceError, SourceQuery, TileData};
use async_trait::async_trait;

/// Data source backed by a remote endpoint returning a JSON array of
/// objects. Query parameters are forwarded as URL query parameters.
pub struct HttpSource {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<TileData, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .query(&query.params)
            .send()
            .await
            .map_err(|e| SourceError::Upstream {
                name: self.name.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Upstream {
                name: self.name.clone(),
                message: format!("HTTP {}", status),
            });
        }

        let value: serde_json::Value =
            response.json().await.map_err(|e| SourceError::Decode {
                name: self.name.clone(),
                message: e.to_string(),
            })?;

        TileData::from_json_rows(&self.name, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_source_name() {
        let source = HttpSource::new("warehouse", "http://localhost/rows", reqwest::Client::new());
        assert_eq!(source.name(), "warehouse");
    }
}
