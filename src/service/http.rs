use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{Map, Value};
use url::Url;

use crate::data::SelectedFile;
use crate::error::{ClientError, Result};
use crate::logging::{log_request, log_request_failed, v_str, ProfileScope};
use crate::model::PredictionResponse;
use crate::service::PredictionService;
use crate::state::Config;

/// Multipart client for the prediction endpoint.
pub struct HttpPredictor {
    client: Client,
    endpoint: Url,
    data_url: Url,
    origin: Url,
}

impl HttpPredictor {
    pub fn new(cfg: &Config) -> Result<Self> {
        let endpoint = cfg.endpoint_url()?;
        let data_url = endpoint
            .join("/data")
            .map_err(|e| ClientError::Config(format!("data url: {}", e)))?;
        let origin = endpoint
            .join("/")
            .map_err(|e| ClientError::Config(format!("origin url: {}", e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            endpoint,
            data_url,
            origin,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn fail(url: &Url, detail: impl std::fmt::Display) -> ClientError {
        let detail = detail.to_string();
        log_request_failed(url.as_str(), &detail);
        ClientError::Request(detail)
    }

    async fn get_json(&self, url: &Url) -> Result<Value> {
        log_request("GET", url.as_str(), None);
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Self::fail(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::fail(url, format!("status {}: {}", status, body)));
        }
        resp.json().await.map_err(|e| Self::fail(url, e))
    }
}

#[async_trait]
impl PredictionService for HttpPredictor {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResponse> {
        let url = &self.endpoint;
        let _scope = ProfileScope::with_context(
            "predict",
            &[("upload_id", v_str(file.upload_id())), ("file", v_str(&file.name))],
        );
        log_request("POST", url.as_str(), Some(file.upload_id()));

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.mime())?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::fail(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::fail(url, format!("status {}: {}", status, body)));
        }

        let body: PredictionResponse = resp.json().await.map_err(|e| Self::fail(url, e))?;
        if let Some(err) = &body.error {
            return Err(Self::fail(url, format!("service error: {}", err)));
        }
        Ok(body)
    }

    async fn fetch_data(&self) -> Result<Vec<Map<String, Value>>> {
        let url = &self.data_url;
        match self.get_json(url).await? {
            Value::Array(rows) => Ok(rows
                .into_iter()
                .map(|row| match row {
                    Value::Object(m) => m,
                    other => {
                        let mut m = Map::new();
                        m.insert("value".to_string(), other);
                        m
                    }
                })
                .collect()),
            Value::Object(m) => {
                let detail = m
                    .get("error")
                    .and_then(|e| e.as_str())
                    .unwrap_or("unexpected object body")
                    .to_string();
                Err(Self::fail(url, detail))
            }
            other => Err(Self::fail(url, format!("unexpected body: {}", other))),
        }
    }

    async fn health(&self) -> bool {
        log_request("GET", self.origin.as_str(), None);
        // Any HTTP answer, even a 404, means the service is up.
        self.client.get(self.origin.clone()).send().await.is_ok()
    }
}
