//! HTTP implementation of the resource adapter port

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use lubesync_core::ResourceAdapter;
use lubesync_domain::{CachedEntity, SyncError};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use super::endpoints::ResourceEndpoints;
use super::form::form_fields;
use crate::http::ResilientTransport;

/// Talks to one resource family through the shared transport.
pub struct HttpResourceAdapter<T> {
    transport: Arc<ResilientTransport>,
    endpoints: ResourceEndpoints,
    _entity: PhantomData<fn() -> T>,
}

impl<T: CachedEntity> HttpResourceAdapter<T> {
    /// Adapter on the standard endpoints for `T`.
    pub fn new(transport: Arc<ResilientTransport>) -> Self {
        Self::with_endpoints(transport, ResourceEndpoints::for_entity(T::ENTITY_TYPE))
    }

    pub fn with_endpoints(transport: Arc<ResilientTransport>, endpoints: ResourceEndpoints) -> Self {
        Self { transport, endpoints, _entity: PhantomData }
    }

    pub fn endpoints(&self) -> &ResourceEndpoints {
        &self.endpoints
    }

    /// Fail on non-success statuses and oversized bodies, else return the body.
    async fn read_body(&self, response: Response) -> Result<Vec<u8>, SyncError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status.as_u16(), body));
        }

        let limit = self.transport.max_response_bytes();
        if !ResilientTransport::is_payload_within_limit(&response, limit) {
            return Err(SyncError::Client(format!("response exceeds {limit} bytes")));
        }

        let bytes = response.bytes().await.map_err(|e| SyncError::Network(e.to_string()))?;
        if bytes.len() as u64 > limit {
            return Err(SyncError::Client(format!("response exceeds {limit} bytes")));
        }
        Ok(bytes.to_vec())
    }

    async fn read_json<R: DeserializeOwned>(&self, response: Response) -> Result<R, SyncError> {
        let body = self.read_body(response).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn id_param(id: i64) -> Vec<(String, String)> {
    vec![("id".to_string(), id.to_string())]
}

/// Accepts `{"id": n}` or a bare number.
fn parse_created_id(body: &[u8]) -> Result<i64, SyncError> {
    let value: Value = serde_json::from_slice(body)?;
    value
        .get("id")
        .unwrap_or(&value)
        .as_i64()
        .ok_or_else(|| SyncError::Client(format!("create response carried no id: {value}")))
}

#[async_trait]
impl<T: CachedEntity> ResourceAdapter<T> for HttpResourceAdapter<T> {
    #[instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE))]
    async fn get_all(&self) -> Result<Vec<T>, SyncError> {
        let response = self.transport.get(&self.endpoints.list, &[]).await?;
        let records: Vec<T> = self.read_json(response).await?;
        debug!(count = records.len(), "Fetched remote collection");
        Ok(records)
    }

    #[instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE))]
    async fn get_one(&self, id: i64) -> Result<Option<T>, SyncError> {
        let response = self.transport.get(&self.endpoints.get, &id_param(id)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.read_json(response).await.map(Some)
    }

    #[instrument(skip(self, entity), fields(entity_type = %T::ENTITY_TYPE, local_id = entity.id()))]
    async fn create(&self, entity: &T) -> Result<i64, SyncError> {
        let form = form_fields(entity, false)?;
        let response = self.transport.post_form(&self.endpoints.add, &form).await?;
        let body = self.read_body(response).await?;
        parse_created_id(&body)
    }

    #[instrument(skip(self, entity), fields(entity_type = %T::ENTITY_TYPE, id = entity.id()))]
    async fn update(&self, entity: &T) -> Result<(), SyncError> {
        let form = form_fields(entity, true)?;
        let response = self.transport.put_form(&self.endpoints.update, &form).await?;
        self.read_body(response).await.map(|_| ())
    }

    #[instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE))]
    async fn delete(&self, id: i64) -> Result<(), SyncError> {
        let response = self.transport.delete(&self.endpoints.delete, &id_param(id)).await?;
        self.read_body(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_id_from_object_or_number() {
        assert_eq!(parse_created_id(br#"{"id": 42}"#).unwrap(), 42);
        assert_eq!(parse_created_id(b"17").unwrap(), 17);
        assert!(matches!(parse_created_id(br#"{"ok": true}"#), Err(SyncError::Client(_))));
        assert!(matches!(parse_created_id(b"<html>"), Err(SyncError::Client(_))));
    }
}
