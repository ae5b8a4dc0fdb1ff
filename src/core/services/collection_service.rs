use crate::AppError;
use crate::api::models::CollectionSummary;
use crate::api::request::RequestSpec;
use crate::api::response::Payload;
use crate::core::clock::Clock;
use crate::core::session::SessionManager;
use crate::error::CliError;
use crate::storage::credentials::CredentialStore;
use serde_json::{Map, Value, json};

pub const COLLECTIONS_PATH: &str = "collections";

pub fn collection_path(collection_id: &str) -> String {
    format!("{}/{}", COLLECTIONS_PATH, collection_id)
}

pub fn list() -> RequestSpec {
    RequestSpec::get(COLLECTIONS_PATH)
}

pub fn create(name: &str, metadata: Option<Value>) -> RequestSpec {
    let mut body = json!({ "name": name });
    if let Some(metadata) = metadata {
        body["metadata"] = metadata;
    }
    RequestSpec::post(COLLECTIONS_PATH).json(body)
}

pub fn get(collection_id: &str) -> RequestSpec {
    RequestSpec::get(collection_path(collection_id))
}

/// PATCH with only the fields being changed; at least one is required.
pub fn update(
    collection_id: &str,
    name: Option<&str>,
    metadata: Option<Value>,
) -> Result<RequestSpec, CliError> {
    let mut body = Map::new();
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        body.insert("name".to_string(), Value::String(name.to_string()));
    }
    if let Some(metadata) = metadata {
        body.insert("metadata".to_string(), metadata);
    }

    if body.is_empty() {
        return Err(CliError::InvalidArguments(
            "update-collection needs --name or --metadata".to_string(),
        ));
    }
    Ok(RequestSpec::patch(collection_path(collection_id)).json(Value::Object(body)))
}

pub fn delete(collection_id: &str) -> RequestSpec {
    RequestSpec::delete(collection_path(collection_id))
}

/// Copy `document_count` and `chunk_count` for `collection_id` from the list
/// payload into the detail payload. The detail endpoint reports stale counts.
pub fn merge_counts(detail: &mut Value, list: &Value, collection_id: &str) {
    let Some(detail) = detail.as_object_mut() else {
        return;
    };
    let Some(entries) = list.as_array() else {
        return;
    };

    let summary = entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<CollectionSummary>(entry.clone()).ok())
        .find(|summary| summary.uuid == collection_id);

    if let Some(summary) = summary {
        detail.insert(
            "document_count".to_string(),
            json!(summary.document_count.unwrap_or(0)),
        );
        detail.insert(
            "chunk_count".to_string(),
            json!(summary.chunk_count.unwrap_or(0)),
        );
    }
}

/// Fetch one collection with counts taken from the collection list.
///
/// A failing list call only costs the count correction, not the result.
pub async fn get_with_counts<S, C>(
    session: &mut SessionManager<S, C>,
    collection_id: &str,
) -> Result<Payload, AppError>
where
    S: CredentialStore,
    C: Clock,
{
    let envelope = session.send(&get(collection_id), true).await?;
    let mut detail = match envelope.payload {
        Payload::Json(detail) => detail,
        other => return Ok(other),
    };

    match session.send(&list(), true).await {
        Ok(listing) => {
            if let Some(listing) = listing.payload.as_json() {
                merge_counts(&mut detail, listing, collection_id);
            }
        }
        Err(e) => log::warn!("Could not refresh counts for {}: {}", collection_id, e),
    }

    Ok(Payload::Json(detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::ApiClient;
    use crate::api::request::HttpMethod;
    use crate::storage::credentials::{Credential, MemoryCredentialStore};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_create_with_and_without_metadata() {
        let spec = create("docs", None);
        assert_eq!(spec.method, HttpMethod::Post);
        assert_eq!(spec.json, Some(json!({"name": "docs"})));

        let spec = create("docs", Some(json!({"team": "search"})));
        assert_eq!(
            spec.json,
            Some(json!({"name": "docs", "metadata": {"team": "search"}}))
        );
    }

    #[test]
    fn test_update_requires_a_field() {
        assert!(update("c1", None, None).is_err());
        assert!(update("c1", Some(""), None).is_err());

        let spec = update("c1", Some("renamed"), None).unwrap();
        assert_eq!(spec.method, HttpMethod::Patch);
        assert_eq!(spec.path, "collections/c1");
        assert_eq!(spec.json, Some(json!({"name": "renamed"})));
    }

    #[test]
    fn test_merge_counts_matches_uuid() {
        let mut detail = json!({"uuid": "c2", "name": "two", "document_count": 0});
        let list = json!([
            {"uuid": "c1", "name": "one", "document_count": 5, "chunk_count": 50},
            {"uuid": "c2", "name": "two", "document_count": 7, "chunk_count": 70}
        ]);
        merge_counts(&mut detail, &list, "c2");
        assert_eq!(detail["document_count"], 7);
        assert_eq!(detail["chunk_count"], 70);
    }

    #[test]
    fn test_merge_counts_missing_entry_leaves_detail() {
        let mut detail = json!({"uuid": "c9", "document_count": 3});
        merge_counts(&mut detail, &json!([{"uuid": "c1"}]), "c9");
        assert_eq!(detail, json!({"uuid": "c9", "document_count": 3}));

        let mut detail = json!({"uuid": "c1"});
        merge_counts(&mut detail, &json!([{"uuid": "c1"}]), "c1");
        assert_eq!(detail["document_count"], 0);
        assert_eq!(detail["chunk_count"], 0);
    }

    #[tokio::test]
    async fn test_get_with_counts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/c1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"uuid": "c1", "document_count": 0})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/collections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"uuid": "c1", "document_count": 12, "chunk_count": 40}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let credential = Credential {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: None,
        };
        let mut session = SessionManager::new(
            ApiClient::new(server.uri()).unwrap(),
            MemoryCredentialStore::with_credential(credential),
        );

        let payload = get_with_counts(&mut session, "c1").await.unwrap();
        assert_eq!(
            payload.as_json(),
            Some(&json!({"uuid": "c1", "document_count": 12, "chunk_count": 40}))
        );
    }
}
