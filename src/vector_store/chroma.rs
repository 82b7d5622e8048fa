//! Chroma vector database adapter.
//!
//! Talks to a running Chroma server over its REST API: get-or-create
//! collection, add, query-by-vector, get-by-metadata-filter, delete-by-ids.
//! Chroma only accepts scalar metadata values, so everything is flattened to
//! strings on the way in (dates as ISO strings, missing fields as "").

use super::{distance_to_score, RecordMetadata, ScoredRecord, TranscriptRecord, VectorStore};
use crate::error::{Result, SamtaleError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

/// Chroma-backed vector store for one named collection.
pub struct ChromaVectorStore {
    http: reqwest::Client,
    base_url: String,
    collection_name: String,
    collection_id: RwLock<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<&'a [f32]>,
    n_results: usize,
    include: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    ids: Vec<String>,
}

impl ChromaVectorStore {
    /// Create an adapter for `collection_name` on the server at `base_url`
    /// (e.g. `http://localhost:8000`).
    pub fn new(base_url: &str, collection_name: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            collection_name: collection_name.to_string(),
            collection_id: RwLock::new(None),
        }
    }

    /// Resolve the collection id, initializing the collection if needed.
    async fn collection_id(&self) -> Result<String> {
        if let Some(id) = self.collection_id.read().await.clone() {
            return Ok(id);
        }
        self.initialize().await?;
        self.collection_id
            .read()
            .await
            .clone()
            .ok_or_else(|| SamtaleError::VectorStore("Collection not initialized".to_string()))
    }

    /// POST a JSON body to a collection endpoint, returning the raw response
    /// after a status check.
    async fn post_collection(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<reqwest::Response> {
        let id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{}/{}", self.base_url, id, endpoint);

        let response = self.http.post(&url).json(body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SamtaleError::VectorStore(format!(
                "Chroma {} failed ({}): {}",
                endpoint, status, detail
            )));
        }
        Ok(response)
    }

    /// Fetch the ids of every record whose `filePath` matches exactly.
    async fn ids_for_path(&self, file_path: &str, limit: Option<usize>) -> Result<Vec<String>> {
        let mut body = json!({
            "where": { "filePath": file_path },
            "include": [],
        });
        if let Some(limit) = limit {
            body["limit"] = json!(limit);
        }

        let response = self.post_collection("get", &body).await?;
        let parsed: GetResponse = response.json().await?;
        Ok(parsed.ids)
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    async fn initialize(&self) -> Result<()> {
        let url = format!("{}/api/v1/collections", self.base_url);
        let body = json!({
            "name": self.collection_name,
            "metadata": { "description": "Call transcript embeddings" },
            "get_or_create": true,
        });

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SamtaleError::VectorStore(format!(
                "Failed to create collection '{}' ({}): {}",
                self.collection_name, status, detail
            )));
        }

        let collection: CollectionResponse = response.json().await?;
        debug!(
            "Using Chroma collection '{}' ({})",
            self.collection_name, collection.id
        );
        *self.collection_id.write().await = Some(collection.id);
        Ok(())
    }

    async fn add(&self, records: &[TranscriptRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let body = json!({
            "ids": records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            "embeddings": records.iter().map(|r| r.embedding.as_slice()).collect::<Vec<_>>(),
            "documents": records.iter().map(|r| r.text.as_str()).collect::<Vec<_>>(),
            "metadatas": records.iter().map(|r| flatten_metadata(&r.metadata)).collect::<Vec<_>>(),
        });

        match self.post_collection("add", &body).await {
            Ok(_) => Ok(records.len()),
            Err(e) => {
                error!("Error adding records to vector database: {}", e);
                Err(e)
            }
        }
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredRecord>> {
        let request = QueryRequest {
            query_embeddings: vec![query_embedding],
            n_results: limit,
            include: vec!["documents", "metadatas", "distances"],
        };
        let body = serde_json::to_value(&request)?;

        let response = match self.post_collection("query", &body).await {
            Ok(r) => r,
            Err(e) => {
                error!("Error searching vector database: {}", e);
                return Err(e);
            }
        };
        let parsed: QueryResponse = response.json().await?;

        let ids = parsed.ids.into_iter().next().unwrap_or_default();
        let distances = parsed
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let documents = parsed
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let metadatas = parsed
            .metadatas
            .and_then(|m| m.into_iter().next())
            .unwrap_or_default();

        let mut results = Vec::with_capacity(ids.len());
        for (i, id) in ids.into_iter().enumerate() {
            // Missing distance defaults to the maximum cosine distance
            let distance = distances.get(i).copied().flatten().unwrap_or(2.0);
            let score = distance_to_score(distance);
            if score < min_score {
                continue;
            }

            let text = documents
                .get(i)
                .cloned()
                .flatten()
                .unwrap_or_default();
            let metadata = metadatas
                .get(i)
                .cloned()
                .flatten()
                .map(|m| unflatten_metadata(&m))
                .unwrap_or_default();

            results.push(ScoredRecord {
                id,
                text,
                score,
                metadata,
            });
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(results)
    }

    async fn exists_for_path(&self, file_path: &str) -> bool {
        match self.ids_for_path(file_path, Some(1)).await {
            Ok(ids) => !ids.is_empty(),
            Err(e) => {
                warn!("Error checking if file is indexed, treating as not indexed: {}", e);
                false
            }
        }
    }

    async fn delete_by_path(&self, file_path: &str) -> Result<usize> {
        let ids = self.ids_for_path(file_path, None).await?;
        if ids.is_empty() {
            return Ok(0);
        }

        let count = ids.len();
        let body = json!({ "ids": ids });
        match self.post_collection("delete", &body).await {
            Ok(_) => Ok(count),
            Err(e) => {
                error!("Error deleting records for {}: {}", file_path, e);
                Err(e)
            }
        }
    }

    async fn count(&self) -> Result<usize> {
        let id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{}/count", self.base_url, id);

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SamtaleError::VectorStore(format!(
                "Chroma count failed ({})",
                response.status()
            )));
        }
        Ok(response.json::<usize>().await?)
    }
}

/// Flatten record metadata to the string-valued map Chroma accepts.
fn flatten_metadata(metadata: &RecordMetadata) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("filePath".to_string(), json!(metadata.file_path));
    map.insert("fileName".to_string(), json!(metadata.file_name));
    map.insert(
        "clientName".to_string(),
        json!(metadata.client_name.as_deref().unwrap_or("")),
    );
    map.insert(
        "callDate".to_string(),
        json!(metadata
            .call_date
            .map(|d| d.to_string())
            .unwrap_or_default()),
    );
    map.insert(
        "participants".to_string(),
        json!(metadata.participants.as_deref().unwrap_or("")),
    );
    map.insert(
        "callType".to_string(),
        json!(metadata.call_type.as_deref().unwrap_or("")),
    );
    map.insert("startTime".to_string(), json!(metadata.start_time.to_string()));
    map.insert("endTime".to_string(), json!(metadata.end_time.to_string()));
    map.insert(
        "speaker".to_string(),
        json!(metadata.speaker.as_deref().unwrap_or("")),
    );
    map
}

/// Rebuild typed metadata from a flattened Chroma map. Empty strings become
/// absent fields again.
fn unflatten_metadata(map: &Map<String, Value>) -> RecordMetadata {
    let get = |key: &str| -> String {
        map.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let optional = |key: &str| -> Option<String> {
        let value = get(key);
        (!value.is_empty()).then_some(value)
    };

    RecordMetadata {
        file_path: get("filePath"),
        file_name: get("fileName"),
        client_name: optional("clientName"),
        call_date: optional("callDate").and_then(|d| d.parse().ok()),
        participants: optional("participants"),
        call_type: optional("callType"),
        start_time: get("startTime").parse().unwrap_or(0.0),
        end_time: get("endTime").parse().unwrap_or(0.0),
        speaker: optional("speaker"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_metadata() -> RecordMetadata {
        RecordMetadata {
            file_path: "/calls/Acme_2024-01-15_Sales.vtt".to_string(),
            file_name: "Acme_2024-01-15_Sales.vtt".to_string(),
            client_name: Some("Acme".to_string()),
            call_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            participants: Some("Jane, John".to_string()),
            call_type: Some("Sales".to_string()),
            start_time: 12.5,
            end_time: 99.0,
            speaker: None,
        }
    }

    #[test]
    fn test_metadata_round_trip() {
        let metadata = sample_metadata();
        let flat = flatten_metadata(&metadata);

        assert_eq!(flat["callDate"], json!("2024-01-15"));
        assert_eq!(flat["speaker"], json!(""));
        assert_eq!(flat["startTime"], json!("12.5"));

        let rebuilt = unflatten_metadata(&flat);
        assert_eq!(rebuilt, metadata);
    }

    #[test]
    fn test_unflatten_tolerates_missing_keys() {
        let metadata = unflatten_metadata(&Map::new());
        assert_eq!(metadata.file_path, "");
        assert!(metadata.call_date.is_none());
        assert_eq!(metadata.start_time, 0.0);
    }
}
