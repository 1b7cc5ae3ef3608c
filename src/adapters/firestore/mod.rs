//! Firestore REST v1 implementation of [`DocumentStore`].

pub mod auth;
pub mod value;

use crate::domain::model::{Collection, Document, DocumentRef, Record};
use crate::domain::ports::{ConfigProvider, DocumentStore};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use url::Url;

const PAGE_SIZE: &str = "300";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// How requests are authorized.
enum Credentials {
    Anonymous,
    Static(String),
    ServiceAccount(auth::TokenSource),
}

pub struct FirestoreStore {
    client: Client,
    documents_url: Url,
    credentials: Credentials,
}

impl FirestoreStore {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.timeout_seconds() {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        let mut documents_url = Url::parse(config.endpoint())?;
        documents_url
            .path_segments_mut()
            .map_err(|_| SyncError::ConfigError {
                message: format!("endpoint '{}' cannot be a base URL", config.endpoint()),
            })?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                config.project_id(),
                "databases",
                config.database(),
                "documents",
            ]);

        tracing::debug!("Firestore documents root: {}", documents_url);

        let client = builder.build()?;
        let credentials = match (config.access_token(), config.service_account()) {
            (Some(token), _) => Credentials::Static(token.to_string()),
            (None, Some(account)) => {
                Credentials::ServiceAccount(auth::TokenSource::new(client.clone(), account.clone())?)
            }
            (None, None) => Credentials::Anonymous,
        };

        Ok(Self {
            client,
            documents_url,
            credentials,
        })
    }

    fn collection_url(&self, collection: Collection) -> Url {
        let mut url = self.documents_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(collection.name());
        }
        url
    }

    fn document_url(&self, collection: Collection, id: &str) -> Url {
        let mut url = self.collection_url(collection);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match &self.credentials {
            Credentials::Anonymous => request,
            Credentials::Static(token) => request.bearer_auth(token),
            Credentials::ServiceAccount(source) => request.bearer_auth(source.token().await?),
        })
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| {
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    body
                }
            });

        Err(SyncError::Store {
            status: status.as_u16(),
            message,
        })
    }

    fn to_document(collection: Collection, wire: WireDocument) -> Result<Document> {
        let id = wire
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SyncError::decode(format!("document name '{}' has no id", wire.name)))?
            .to_string();

        Ok(Document {
            reference: DocumentRef::new(collection, id),
            record: Record::from(value::decode_fields(&wire.fields)?),
            update_time: wire.update_time,
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn upsert(&self, collection: Collection, id: &str, record: &Record) -> Result<()> {
        let url = self.document_url(collection, id);
        tracing::debug!("PATCH {}", url);

        let body = json!({ "fields": value::encode_fields(&record.data) });
        let response = self
            .authorize(self.client.patch(url))
            .await?
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.collection_url(collection);
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }
            tracing::debug!("GET {}", url);

            let response = self.authorize(self.client.get(url)).await?.send().await?;
            let page: ListDocumentsResponse = Self::check(response).await?.json().await?;

            for wire in page.documents {
                documents.push(Self::to_document(collection, wire)?);
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    async fn delete(&self, reference: &DocumentRef) -> Result<()> {
        let url = self.document_url(reference.collection, &reference.id);
        tracing::debug!("DELETE {}", url);

        let response = self.authorize(self.client.delete(url)).await?.send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
