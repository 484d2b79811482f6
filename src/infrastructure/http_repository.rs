// HTTP repository implementation over the tank backend's JSON API
use crate::application::error::FetchError;
use crate::application::tank_repository::TankRepository;
use crate::domain::fields::{RawRecord, resolve};
use crate::domain::normalize::{HISTORY_ENVELOPES, SITE_ENVELOPES, TANK_ENVELOPES, unwrap_rows};
use crate::infrastructure::config::{BackendSettings, prepare_path};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpTankRepository {
    client: reqwest::Client,
    base_url: String,
    settings: BackendSettings,
}

impl HttpTankRepository {
    pub fn new(settings: BackendSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            settings,
        })
    }

    fn build_url(&self, template: &str, vars: &[(&str, &str)]) -> String {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), urlencoding::encode(v).into_owned()))
            .collect();
        format!("{}{}", self.base_url, prepare_path(template, &vars))
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
                body.truncate(cut);
            }
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))
    }

    async fn get_rows(&self, url: &str, envelopes: &[&str]) -> Result<Vec<RawRecord>, FetchError> {
        let payload = self.get_json(url).await?;
        unwrap_rows(payload, envelopes).ok_or_else(|| {
            FetchError::Malformed(format!("{} did not return an array or a rows envelope", url))
        })
    }
}

#[async_trait]
impl TankRepository for HttpTankRepository {
    async fn list_sites(&self) -> Result<Vec<RawRecord>, FetchError> {
        let url = self.build_url(&self.settings.sites_path, &[]);
        self.get_rows(&url, SITE_ENVELOPES).await
    }

    async fn list_tanks(&self, site: Option<&str>) -> Result<Vec<RawRecord>, FetchError> {
        let url = match site {
            Some(site) => self.build_url(&self.settings.tanks_by_site_path, &[("site", site)]),
            None => self.build_url(&self.settings.tanks_path, &[]),
        };
        self.get_rows(&url, TANK_ENVELOPES).await
    }

    async fn list_history(
        &self,
        site: &str,
        tank: &str,
        limit: usize,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let limit = limit.to_string();
        let url = self.build_url(
            &self.settings.history_path,
            &[("site", site), ("tank", tank), ("limit", &limit)],
        );
        self.get_rows(&url, HISTORY_ENVELOPES).await
    }

    async fn changes_detected(&self) -> Result<Option<bool>, FetchError> {
        let Some(path) = &self.settings.status_path else {
            return Ok(None);
        };
        let url = self.build_url(path, &[]);
        let payload = match self.get_json(&url).await {
            Err(FetchError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                return Ok(None);
            }
            other => other?,
        };

        let changed = payload
            .as_object()
            .and_then(|record| resolve(record, &["changesDetected", "changes_detected", "changed"]))
            .and_then(Value::as_bool);
        if changed.is_none() {
            tracing::debug!("Status endpoint returned no changesDetected flag");
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository(base_url: &str) -> HttpTankRepository {
        HttpTankRepository::new(BackendSettings {
            base_url: base_url.to_string(),
            ..BackendSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_build_url_encodes_values() {
        let repo = repository("http://backend:5000/api/");
        let url = repo.build_url("/tanks?site=${site}", &[("site", "ALM 1/B")]);
        assert_eq!(url, "http://backend:5000/api/tanks?site=ALM%201%2FB");
    }

    #[test]
    fn test_history_template_ignores_unused_vars() {
        let repo = repository("http://backend");
        let url = repo.build_url(
            "/history?tankId=${tank}&limit=${limit}",
            &[("site", "A"), ("tank", "T1"), ("limit", "5")],
        );
        assert_eq!(url, "http://backend/history?tankId=T1&limit=5");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let repo = repository("http://127.0.0.1:1");
        let err = repo.list_tanks(None).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
