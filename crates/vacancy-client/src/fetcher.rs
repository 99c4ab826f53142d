use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use vacancy_core::error::AppError;
use vacancy_core::models::{ApiEmployer, VacancyItem, VacancyPage};
use vacancy_core::traits::{CompanyBatch, FetchFailure, JobBoard};

pub const DEFAULT_BASE_URL: &str = "https://api.hh.ru";
const USER_AGENT: &str = concat!("vacancies/", env!("CARGO_PKG_VERSION"));

/// Client for the hh.ru public API.
///
/// Only two read-only endpoints are used: `/employers/{id}` and
/// `/vacancies?employer_id={id}`. No authentication, no retry. Without
/// [`with_timeout`](Self::with_timeout) requests use reqwest's defaults.
#[derive(Clone)]
pub struct HhClient {
    client: Client,
    base_url: Url,
    timeout_secs: Option<u64>,
}

impl HhClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, AppError> {
        Self::build(base_url, None)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(self.base_url.as_str(), Some(timeout))
    }

    fn build(base_url: &str, timeout: Option<Duration>) -> Result<Self, AppError> {
        let base_url = parse_base_url(base_url)?;

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout_secs: timeout.map(|t| t.as_secs()),
        })
    }

    /// Fetch a single employer.
    pub async fn fetch_employer(&self, id: u64) -> Result<ApiEmployer, AppError> {
        let url = self.endpoint(&["employers", &id.to_string()]);
        let employer: ApiEmployer = self.get_json(url).await?;

        if employer.id != id {
            return Err(AppError::Generic(format!(
                "asked for employer {id}, API returned {}",
                employer.id
            )));
        }
        Ok(employer)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // parse_base_url rejects cannot-be-a-base URLs, so this always applies.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn vacancies_url(&self, employer_id: u64) -> Url {
        let mut url = self.endpoint(&["vacancies"]);
        url.query_pairs_mut()
            .append_pair("employer_id", &employer_id.to_string());
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, AppError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;

        Ok(serde_json::from_slice(&body)?)
    }

    fn request_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            // Sub-second or absent limits have no whole-second value to report.
            match self.timeout_secs {
                Some(secs) if secs > 0 => AppError::Timeout(secs),
                _ => AppError::NetworkError(format!("Request timed out: {e}")),
            }
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {e}"))
        } else {
            AppError::HttpError(e.to_string())
        }
    }
}

impl JobBoard for HhClient {
    async fn get_companies(&self, ids: &[u64]) -> CompanyBatch {
        let mut batch = CompanyBatch::default();

        for &id in ids {
            match self.fetch_employer(id).await {
                Ok(employer) => {
                    tracing::debug!(employer_id = id, "Fetched employer '{}'", employer.name);
                    batch.companies.push(employer);
                }
                Err(e) => {
                    tracing::warn!(employer_id = id, error = %e, "Failed to fetch employer");
                    batch.failures.push(FetchFailure {
                        employer_id: id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        batch
    }

    async fn get_vacancies(&self, employer_id: u64) -> Result<Vec<VacancyItem>, AppError> {
        let page: VacancyPage = self
            .get_json(self.vacancies_url(employer_id))
            .await
            .inspect_err(|e| {
                tracing::warn!(employer_id, error = %e, "Failed to fetch vacancies");
            })?;

        let items = page.into_items();
        tracing::debug!(employer_id, count = items.len(), "Fetched vacancies");
        Ok(items)
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, AppError> {
    let trimmed = base_url.trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| AppError::ConfigError(format!("Invalid API base URL '{base_url}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(AppError::ConfigError(format!(
            "API base URL scheme '{}' is not allowed (only http/https)",
            url.scheme()
        )));
    }

    Ok(url)
}
