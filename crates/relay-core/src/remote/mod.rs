//! Remote document store client.
//!
//! One logical operation matters to the relay: a full-overwrite upsert of
//! the notification document addressed by the sync code. Document reads
//! exist only for the on-demand service info fetch.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::models::{ServiceInfo, SyncCode};
use crate::util::compact_text;

/// Collection receiving forwarded notification documents.
pub const NOTIFICATION_COLLECTION: &str = "pega";
/// Collection holding the read-only per-device service documents.
pub const SERVICE_COLLECTION: &str = "services";

const HTTP_TIMEOUT_SECS: u64 = 10;

/// Trait for document-store access (async).
#[allow(async_fn_in_trait)]
pub trait DocumentClient {
    /// Fully overwrite the document `id` in `collection` with `body`.
    /// Creates the document when it does not exist (no merge).
    async fn upsert_document<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        body: &T,
    ) -> Result<()>;

    /// Fetch a document; an absent document is `None`, not an error.
    async fn fetch_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>>;
}

/// HTTP implementation of `DocumentClient`.
///
/// Documents live at `{base_url}/{collection}/{id}`; upserts are `PUT`
/// (overwrite), reads are `GET`.
#[derive(Clone)]
pub struct HttpDocumentClient {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl HttpDocumentClient {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { config, client })
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url(),
            urlencoding::encode(collection),
            urlencoding::encode(id)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.auth_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl DocumentClient for HttpDocumentClient {
    async fn upsert_document<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        body: &T,
    ) -> Result<()> {
        let request = self
            .client
            .put(self.document_url(collection, id))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body);
        let response = self.authorize(request).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(Error::RemoteApi(parse_api_error(status, &body)))
        }
    }

    async fn fetch_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>> {
        let request = self
            .client
            .get(self.document_url(collection, id))
            .header(reqwest::header::ACCEPT, "application/json");
        let response = self.authorize(request).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RemoteApi(parse_api_error(status, &body)));
        }

        Ok(Some(response.json::<T>().await?))
    }
}

/// Fetch the service document addressed by the sync code.
pub async fn fetch_service_info<C: DocumentClient>(
    client: &C,
    code: &SyncCode,
) -> Result<Option<ServiceInfo>> {
    client
        .fetch_document(SERVICE_COLLECTION, code.as_str())
        .await
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn document_url_joins_and_encodes_segments() {
        let config = RemoteConfig::new("https://api.example.com/", None).unwrap();
        let client = HttpDocumentClient::new(config).unwrap();

        assert_eq!(
            client.document_url(NOTIFICATION_COLLECTION, "abc42"),
            "https://api.example.com/pega/abc42"
        );
        assert_eq!(
            client.document_url("services", "a/b c"),
            "https://api.example.com/services/a%2Fb%20c"
        );
    }

    #[test]
    fn parse_api_error_prefers_structured_message() {
        assert_eq!(
            parse_api_error(
                StatusCode::FORBIDDEN,
                r#"{"message": "missing credentials"}"#
            ),
            "missing credentials (403)"
        );
        assert_eq!(
            parse_api_error(StatusCode::BAD_REQUEST, r#"{"error": "bad id"}"#),
            "bad id (400)"
        );
    }

    #[test]
    fn parse_api_error_falls_back_to_body_text() {
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "  boom  "),
            "boom (500)"
        );
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "HTTP 500"
        );
    }

    #[derive(Clone, Default)]
    struct StubClient {
        fetches: Arc<Mutex<Vec<(String, String)>>>,
        document: Option<serde_json::Value>,
    }

    impl DocumentClient for StubClient {
        async fn upsert_document<T: Serialize + Sync>(
            &self,
            _collection: &str,
            _id: &str,
            _body: &T,
        ) -> Result<()> {
            Ok(())
        }

        async fn fetch_document<T: DeserializeOwned>(
            &self,
            collection: &str,
            id: &str,
        ) -> Result<Option<T>> {
            self.fetches
                .lock()
                .unwrap()
                .push((collection.to_string(), id.to_string()));
            self.document
                .as_ref()
                .map(|value| Ok(serde_json::from_value(value.clone())?))
                .transpose()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_service_info_reads_services_by_code() {
        let client = StubClient {
            document: Some(serde_json::json!({"name": "Pega-S", "battery": 57.0})),
            ..Default::default()
        };
        let code = SyncCode::new("abc42").unwrap();

        let info = fetch_service_info(&client, &code).await.unwrap().unwrap();
        assert_eq!(info.name.as_deref(), Some("Pega-S"));
        assert_eq!(
            client.fetches.lock().unwrap().as_slice(),
            &[("services".to_string(), "abc42".to_string())]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_service_info_absent_document_is_none() {
        let client = StubClient::default();
        let code = SyncCode::new("abc42").unwrap();

        assert!(fetch_service_info(&client, &code).await.unwrap().is_none());
    }
}
