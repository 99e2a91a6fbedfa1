// src/graph/neo4j.rs
// =============================================================================
// Neo4j backend over the HTTP transactional API.
//
// Every upsert is sent to `POST {uri}/db/{database}/tx/commit`, which opens a
// transaction, runs the statement and commits in one round trip. If the
// statement fails Neo4j rolls the whole transaction back, so a page is either
// fully written or not at all.
//
// Neo4j reports statement errors with HTTP 200 and an `errors` array, so we
// have to look at the body, not just the status code.
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::info;
use url::Url;

use super::writer::{GraphError, GraphStore, PageLinksUpsert};

const UPSERT_PAGE_LINKS: &str = "\
MERGE (p:Page {title: $page})
ON CREATE SET p.page_id = $page_id
ON MATCH SET p.page_id = coalesce(p.page_id, $page_id)
WITH p
UNWIND $links AS l
    MERGE (l_page:Page {title: l})
    MERGE (p)-[:HAS_LINK]->(l_page)";

const PAGE_TITLE_CONSTRAINT: &str =
    "CREATE CONSTRAINT page_title IF NOT EXISTS FOR (p:Page) REQUIRE p.title IS UNIQUE";

/// Connection settings for Neo4j.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    /// Base HTTP URI, e.g. `http://localhost:7474`
    pub uri: Url,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

#[derive(Debug, Clone)]
pub struct Neo4jStore {
    client: Client,
    commit_url: Url,
    user: String,
    password: String,
}

impl Neo4jStore {
    pub fn new(config: Neo4jConfig) -> Result<Self, GraphError> {
        let base = config.uri.as_str().trim_end_matches('/');
        let commit_url = Url::parse(&format!("{}/db/{}/tx/commit", base, config.database))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            commit_url,
            user: config.user,
            password: config.password,
        })
    }

    /// Makes sure page titles are unique, which also lets MERGE use an index.
    ///
    /// Called once before crawling; it doubles as the connectivity check.
    pub async fn ensure_schema(&self) -> Result<(), GraphError> {
        self.commit(Statement {
            statement: PAGE_TITLE_CONSTRAINT,
            parameters: json!({}),
        })
        .await?;
        info!(endpoint = %self.commit_url, "graph store ready");
        Ok(())
    }

    async fn commit(&self, statement: Statement<'_>) -> Result<(), GraphError> {
        let request = CommitRequest {
            statements: vec![statement],
        };

        let response = self
            .client
            .post(self.commit_url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Status { status, body });
        }

        let body: CommitResponse = response.json().await?;
        if let Some(error) = body.errors.into_iter().next() {
            return Err(GraphError::Rejected {
                code: error.code,
                message: error.message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn upsert_page_links(&self, upsert: &PageLinksUpsert) -> Result<(), GraphError> {
        self.commit(Statement {
            statement: UPSERT_PAGE_LINKS,
            parameters: json!({
                "page": upsert.page,
                "page_id": upsert.page_id,
                "links": upsert.links,
            }),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> Neo4jStore {
        Neo4jStore::new(Neo4jConfig {
            uri: Url::parse(&server.uri()).unwrap(),
            user: "neo4j".to_string(),
            password: "secret".to_string(),
            database: "wiki".to_string(),
        })
        .unwrap()
    }

    fn upsert() -> PageLinksUpsert {
        PageLinksUpsert {
            page: "Hydrogen".to_string(),
            page_id: Some(13255),
            links: vec!["Oxygen".to_string(), "Water".to_string()],
        }
    }

    #[tokio::test]
    async fn test_upsert_sends_one_parameterised_statement() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/db/wiki/tx/commit"))
            .and(basic_auth("neo4j", "secret"))
            .and(body_partial_json(json!({
                "statements": [ {
                    "statement": UPSERT_PAGE_LINKS,
                    "parameters": {
                        "page": "Hydrogen",
                        "page_id": 13255,
                        "links": ["Oxygen", "Water"]
                    }
                } ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "results": [], "errors": [] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).upsert_page_links(&upsert()).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_page_id_is_sent_as_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "statements": [ { "parameters": { "page_id": null } } ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "errors": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let mut without_id = upsert();
        without_id.page_id = None;
        store_for(&server).upsert_page_links(&without_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_statement_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [],
                "errors": [ {
                    "code": "Neo.ClientError.Schema.ConstraintValidationFailed",
                    "message": "already exists"
                } ]
            })))
            .mount(&server)
            .await;

        let err = store_for(&server).upsert_page_links(&upsert()).await.unwrap_err();
        assert!(matches!(err, GraphError::Rejected { ref code, .. }
            if code == "Neo.ClientError.Schema.ConstraintValidationFailed"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let err = store_for(&server).ensure_schema().await.unwrap_err();
        match err {
            GraphError::Status { status, body } => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(body, "bad credentials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_ensure_schema_creates_constraint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/db/wiki/tx/commit"))
            .and(body_partial_json(json!({
                "statements": [ { "statement": PAGE_TITLE_CONSTRAINT } ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "errors": [] })))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).ensure_schema().await.unwrap();
    }

    #[test]
    fn test_commit_url_ignores_trailing_slash() {
        let store = Neo4jStore::new(Neo4jConfig {
            uri: Url::parse("http://localhost:7474/").unwrap(),
            user: String::new(),
            password: String::new(),
            database: "neo4j".to_string(),
        })
        .unwrap();
        assert_eq!(store.commit_url.as_str(), "http://localhost:7474/db/neo4j/tx/commit");
    }
}
