//! HTTP contract tests.
//!
//! Drives the full router (middleware, extractors, handlers and services)
//! against in-process backends and checks status codes, bodies and headers
//! as web clients observe them.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use async_trait::async_trait;
use atlas::config::AtlasConfig;
use atlas::http::{AppState, Dependencies, router};
use atlas::models::Record;
use atlas::security::{RateLimitConfig, hash_password};
use atlas::storage::{CypherQuery, GraphStore, MemoryObjectStore, ObjectStore};
use atlas::{Embedder, Error, ImageGenerator, Result};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const SECRET: &str = "k7Qp2xV9mZr4Lw8Tn3Bc6Hy1Jd5Fg0Us";
const BUCKET: &str = "atlas-media";
const PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

// ============================================================================
// Test Helpers
// ============================================================================

/// Graph store answering by query-text fragment.
#[derive(Default)]
struct FakeGraph {
    responses: Mutex<Vec<(String, Vec<Record>)>>,
    failures: Mutex<Vec<String>>,
    executed: Mutex<Vec<CypherQuery>>,
}

impl FakeGraph {
    fn respond(self, fragment: &str, records: Vec<Record>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push((fragment.to_string(), records));
        self
    }

    fn fail_on(self, fragment: &str) -> Self {
        self.failures.lock().unwrap().push(fragment.to_string());
        self
    }

    fn find(&self, fragment: &str) -> Option<CypherQuery> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .find(|query| query.text.contains(fragment))
            .cloned()
    }
}

#[async_trait]
impl GraphStore for FakeGraph {
    async fn execute(&self, query: CypherQuery) -> Result<Vec<Record>> {
        self.executed.lock().unwrap().push(query.clone());
        if self
            .failures
            .lock()
            .unwrap()
            .iter()
            .any(|fragment| query.text.contains(fragment.as_str()))
        {
            return Err(Error::operation("neo4j_execute", "connection refused"));
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| query.text.contains(fragment.as_str()))
            .map(|(_, records)| records.clone())
            .unwrap_or_default())
    }
}

struct FakeEmbedder;

#[async_trait]
impl Embedder for FakeEmbedder {
    fn dimensions(&self) -> usize {
        3
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f64>> {
        Ok(vec![0.1, 0.2, 0.3])
    }
}

#[derive(Default)]
struct FakeImages {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(PNG.to_vec())
    }
}

struct Harness {
    app: Router,
    state: AppState,
    graph: Arc<FakeGraph>,
    objects: Arc<MemoryObjectStore>,
    images: Arc<FakeImages>,
}

impl Harness {
    fn new(graph: FakeGraph) -> Self {
        Self::with_config(
            graph,
            AtlasConfig::default()
                .with_jwt_secret(SECRET)
                .with_bucket(BUCKET),
        )
    }

    fn with_config(graph: FakeGraph, config: AtlasConfig) -> Self {
        let graph = Arc::new(graph);
        let objects = Arc::new(MemoryObjectStore::new());
        let images = Arc::new(FakeImages::default());
        let deps = Dependencies {
            graph: graph.clone(),
            embedder: Arc::new(FakeEmbedder),
            images: Some(images.clone() as Arc<dyn ImageGenerator>),
            objects: objects.clone(),
        };
        let state = AppState::new(deps, &config).expect("state");
        Self {
            app: router(state.clone(), &config.server),
            state,
            graph,
            objects,
            images,
        }
    }

    fn token(&self, username: &str) -> String {
        self.state.tokens().issue(username).expect("token")
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.expect("response")
    }

    async fn get_secure(&self, uri: &str) -> Response {
        self.send(
            Request::get(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token("ada")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn post_secure(&self, uri: &str, body: &Value) -> Response {
        self.send(
            Request::post(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token("ada")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn put_secure(&self, uri: &str, body: &Value) -> Response {
        self.send(
            Request::put(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token("ada")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn node(element_id: &str, name: &str, extra: Value) -> Value {
    let mut props = json!({"name": name});
    if let (Some(props), Value::Object(extra)) = (props.as_object_mut(), extra) {
        props.extend(extra);
    }
    json!({
        "Id": 7,
        "ElementId": element_id,
        "Labels": ["Skill"],
        "Props": props,
    })
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_sign_up_returns_token() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .send(post_json(
            "/api/sign-up",
            &json!({"username": "ada", "password": "hunter22", "phone": "555-0100"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let token = body["token"].as_str().expect("token string");
    let claims = h.state.tokens().validate(token).expect("valid token");
    assert_eq!(claims.sub, "ada");

    let created = h.graph.find("CREATE (p:Person:L3").expect("create statement");
    let stored = created.get_param("password").and_then(Value::as_str).unwrap();
    assert_ne!(stored, "hunter22");
}

#[tokio::test]
async fn test_sign_up_duplicate_is_not_acceptable() {
    let h = Harness::new(FakeGraph::default().respond(
        "WHERE n.phone = $phone OR n.username = $username",
        vec![Record::from_pairs([("id", json!("4:x:1"))])],
    ));

    let response = h
        .send(post_json(
            "/api/sign-up",
            &json!({"username": "ada", "password": "hunter22", "phone": "555-0100"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert!(h.graph.find("CREATE (p:Person").is_none());
}

#[tokio::test]
async fn test_sign_up_missing_fields_is_bad_request() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .send(post_json("/api/sign-up", &json!({"username": "ada"})))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid request");
}

#[tokio::test]
async fn test_login_round_trip() {
    let hash = hash_password("hunter22").unwrap();
    let h = Harness::new(FakeGraph::default().respond(
        "RETURN n.password AS password",
        vec![Record::from_pairs([("password", json!(hash))])],
    ));

    let ok = h
        .send(post_json(
            "/api/login",
            &json!({"username": "ada", "password": "hunter22"}),
        ))
        .await;
    assert_eq!(ok.status(), StatusCode::OK);

    let wrong = h
        .send(post_json(
            "/api/login",
            &json!({"username": "ada", "password": "hunter23"}),
        ))
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_user_is_unauthorized() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .send(post_json(
            "/api/login",
            &json!({"username": "nobody", "password": "hunter22"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .send(
            Request::post("/api/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

// ============================================================================
// Authentication and middleware
// ============================================================================

#[tokio::test]
async fn test_secure_route_requires_token() {
    let h = Harness::new(FakeGraph::default());

    let missing = h
        .send(
            Request::get("/api/secure/graph/get-nodes")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(missing).await, json!({"error": "unauthorized"}));

    let invalid = h
        .send(
            Request::get("/api/secure/graph/get-nodes")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);

    let wrong_scheme = h
        .send(
            Request::get("/api/secure/graph/get-nodes")
                .header(header::AUTHORIZATION, format!("Basic {}", h.token("ada")))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(wrong_scheme.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let h = Harness::new(FakeGraph::default());
    let other = Harness::with_config(
        FakeGraph::default(),
        AtlasConfig::default().with_jwt_secret("Zr8Nq4Wd2Lm7Xc1Vb6Kt9Pj3Hs5Gf0Ya"),
    );

    let response = h
        .send(
            Request::get("/api/secure/graph/get-nodes")
                .header(header::AUTHORIZATION, format!("Bearer {}", other.token("ada")))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rate_limit_rejects_excess_requests() {
    let h = Harness::with_config(
        FakeGraph::default(),
        AtlasConfig::default()
            .with_jwt_secret(SECRET)
            .with_rate_limit(RateLimitConfig::default().with_max_requests(2)),
    );
    let request = || {
        Request::get("/api/")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(h.send(request()).await.status(), StatusCode::OK);
    assert_eq!(h.send(request()).await.status(), StatusCode::OK);

    let limited = h.send(request()).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(json_body(limited).await["error"], "rate limit exceeded");

    // Other clients keep their own window.
    let other = h
        .send(
            Request::get("/api/")
                .header("x-forwarded-for", "198.51.100.4")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .send(
            Request::get("/api")
                .header("x-request-id", "trace-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "trace-abc-123");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers["x-permitted-cross-domain-policies"], "none");
    assert_eq!(json_body(response).await, json!("ok"));
}

#[tokio::test]
async fn test_request_id_generated_when_absent() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .send(Request::get("/api/").body(Body::empty()).unwrap())
        .await;

    let id = response.headers()["x-request-id"].to_str().unwrap();
    assert!(!id.is_empty());
}

#[tokio::test]
async fn test_healthcheck_reports_graph_status() {
    let up = Harness::new(FakeGraph::default());
    let response = up
        .send(Request::get("/api/healthcheck").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["graph"], "up");

    let down = Harness::new(FakeGraph::default().fail_on("RETURN 1"));
    let response = down
        .send(Request::get("/api/healthcheck").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["graph"], "down");
}

#[tokio::test]
async fn test_metrics_route_absent_without_exporter() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .send(Request::get("/metrics").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Graph routes
// ============================================================================

#[tokio::test]
async fn test_get_nodes_returns_records() {
    let h = Harness::new(FakeGraph::default().respond(
        "MATCH (node:`Skill`)",
        vec![Record::from_pairs([
            ("node", node("4:x:7", "Rust", json!({}))),
            ("relationships", json!([])),
            ("affiliatedNodes", json!([])),
        ])],
    ));

    let response = h
        .get_secure("/api/secure/graph/get-nodes?labels=Skill&properties=%7B%22name%22%3A%22Rust%22%7D")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["Keys"], json!(["node", "relationships", "affiliatedNodes"]));
    assert_eq!(body[0]["Values"][0]["Props"]["name"], "Rust");

    let query = h.graph.find("MATCH (node:`Skill`)").unwrap();
    assert_eq!(query.get_param("prop_0"), Some(&json!("Rust")));
}

#[tokio::test]
async fn test_get_nodes_hides_person_passwords() {
    let person = json!({
        "Id": 1,
        "ElementId": "4:x:1",
        "Labels": ["Person", "L3"],
        "Props": {"username": "grace", "password": "$argon2id$v=19$..."}
    });
    let h = Harness::new(FakeGraph::default().respond(
        "MATCH (node:`Person`)",
        vec![Record::from_pairs([
            ("node", person.clone()),
            ("relationships", json!([])),
            ("affiliatedNodes", json!([person])),
        ])],
    ));

    let response = h.get_secure("/api/secure/graph/get-nodes?labels=Person").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["Values"][0]["Props"]["username"], "grace");
    assert!(body[0]["Values"][0]["Props"].get("password").is_none());
    assert!(body[0]["Values"][2][0]["Props"].get("password").is_none());
    assert!(!body.to_string().contains("argon2"));
}

#[tokio::test]
async fn test_get_nodes_rejects_bad_properties() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .get_secure("/api/secure/graph/get-nodes?properties=%7Bnope")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_node_without_labels_is_bad_request() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .post_secure(
            "/api/secure/graph/create-node",
            &json!({"labels": [], "properties": {"name": "Rust"}}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.graph.find("CREATE (n").is_none());
}

#[tokio::test]
async fn test_create_node_stores_image_and_embedding() {
    let h = Harness::new(FakeGraph::default().respond(
        "CREATE (n:`Skill`)",
        vec![Record::from_pairs([(
            "node",
            node("4:x:9", "Rust", json!({"description": "A systems language"})),
        )])],
    ));

    let response = h
        .post_secure(
            "/api/secure/graph/create-node",
            &json!({
                "labels": ["Skill"],
                "properties": {"name": "Rust", "description": "A systems language"}
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await[0]["Values"][0]["ElementId"], "4:x:9");

    let created = h.graph.find("CREATE (n:`Skill`)").unwrap();
    let properties = created.get_param("properties").unwrap();
    assert_eq!(properties["embedding"], json!([0.1, 0.2, 0.3]));
    let image_key = properties["image"].as_str().unwrap();
    assert!(image_key.starts_with("Rust_"));
    assert!(image_key.ends_with(".png"));

    let stored = h.objects.get(BUCKET, image_key).await.unwrap();
    assert_eq!(stored.bytes, PNG.to_vec());
    assert_eq!(h.images.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_node_similar_to_existing_conflicts() {
    let h = Harness::new(FakeGraph::default().respond(
        "queryNodes",
        vec![Record::from_pairs([
            ("name", json!("Rust lang")),
            ("description", json!("A systems language")),
            ("id", json!("4:x:2")),
            ("score", json!(0.97)),
        ])],
    ));

    let response = h
        .post_secure(
            "/api/secure/graph/create-node",
            &json!({"labels": ["Skill"], "properties": {"name": "Rust"}}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"], "similar node already exists");
    assert!((body["details"]["score"].as_f64().unwrap() - 0.97).abs() < f64::EPSILON);
    assert!((body["score"].as_f64().unwrap() - 0.97).abs() < f64::EPSILON);
    assert!(h.graph.find("CREATE (n").is_none());
    assert!(h.objects.is_empty());
}

#[tokio::test]
async fn test_update_relationship_missing_target_is_not_found() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .send(
            Request::put("/api/secure/graph/update-relationship")
                .header(header::AUTHORIZATION, format!("Bearer {}", h.token("ada")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"targetId": "5:x:404", "properties": {"since": "2020"}}).to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_relationship_reports_count() {
    let h = Harness::new(FakeGraph::default().respond(
        "DELETE r",
        vec![Record::from_pairs([("deleted", json!(1))])],
    ));

    let response = h
        .post_secure(
            "/api/secure/graph/delete-relationship",
            &json!({"relationshipId": "5:x:1"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"deleted": 1}));
}

#[tokio::test]
async fn test_similar_nodes_requires_exactly_one_reference() {
    let h = Harness::new(FakeGraph::default());

    let both = h
        .post_secure(
            "/api/secure/graph/similar-nodes",
            &json!({"nodeId": "4:x:1", "embedding": [0.1, 0.2, 0.3]}),
        )
        .await;
    assert_eq!(both.status(), StatusCode::BAD_REQUEST);

    let neither = h
        .post_secure("/api/secure/graph/similar-nodes", &json!({}))
        .await;
    assert_eq!(neither.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_nodes_returns_node_maps() {
    let h = Harness::new(FakeGraph::default().respond(
        "toLower",
        vec![Record::from_pairs([(
            "node",
            json!({
                "elementId": "4:x:3",
                "labels": ["Skill"],
                "props": {"name": "Rust", "description": "Systems language"}
            }),
        )])],
    ));

    let response = h
        .get_secure("/api/secure/graph/search-nodes?query=rus&limit=500")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["nodes"][0]["elementId"], "4:x:3");
    assert_eq!(body["nodes"][0]["labels"], json!(["Skill"]));
    assert_eq!(body["nodes"][0]["props"]["name"], "Rust");

    let query = h.graph.find("toLower").unwrap();
    assert_eq!(query.get_param("limit"), Some(&json!(100)));
    assert!(query.text.contains("toLower(n.name) CONTAINS toLower($query)"));
    assert!(!query.text.contains("n.description"));
}

// ============================================================================
// Domains
// ============================================================================

fn domain_body(name: &str) -> Value {
    json!({
        "domain": {"name": name, "description": "Food and kitchens"},
        "levels": [{
            "level": 1,
            "name": "Novice",
            "description": "First steps",
            "points_required": 10,
            "requirements": {
                "knowledge": [{"nodeElementId": "4:k:1", "bloom_level": "Remember"}],
                "skills": [{"newNode": {"name": "Knife skills", "description": "Cutting"}, "dreyfus_level": "Novice"}],
                "traits": [],
                "milestones": []
            }
        }]
    })
}

fn element_id_rows(id: &str) -> Vec<Record> {
    vec![Record::from_pairs([("elementId", json!(id))])]
}

#[tokio::test]
async fn test_create_domain_returns_created_nodes() {
    let h = Harness::new(
        FakeGraph::default()
            .respond("CREATE (d:Domain", element_id_rows("4:d:1"))
            .respond("CREATE (l:Domain_Level", element_id_rows("4:l:1"))
            .respond("MERGE (n:Skill", element_id_rows("4:s:5"))
            .respond(
                "CREATE (l)-[r:",
                vec![Record::from_pairs([("linked", json!(1))])],
            ),
    );

    let response = h
        .post_secure("/api/secure/graph/create-domain", &domain_body("Cooking"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["domain"], json!({"elementId": "4:d:1", "name": "Cooking"}));
    assert_eq!(
        body["createdNodes"],
        json!([{"elementId": "4:s:5", "name": "Knife skills", "labels": ["Skill"]}])
    );
    assert!(body.get("affectedUserProgressCount").is_none());

    let level = h.graph.find("CREATE (l:Domain_Level").unwrap();
    assert_eq!(level.get_param("points"), Some(&json!(10)));
    let link = h.graph.find("REQUIRES_KNOWLEDGE").unwrap();
    assert_eq!(link.get_param("grade"), Some(&json!("Remember")));
}

#[tokio::test]
async fn test_create_domain_validation_is_bad_request() {
    let h = Harness::new(
        FakeGraph::default().respond("MATCH (d:Domain {name: $name})", element_id_rows("4:d:9")),
    );

    let blank = h
        .post_secure("/api/secure/graph/create-domain", &domain_body(""))
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(blank).await["error"], "Domain name is required");

    let no_levels = h
        .post_secure(
            "/api/secure/graph/create-domain",
            &json!({"domain": {"name": "Baking", "description": ""}, "levels": []}),
        )
        .await;
    assert_eq!(no_levels.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(no_levels).await["error"], "At least one level is required");

    let taken = h
        .post_secure("/api/secure/graph/create-domain", &domain_body("Cooking"))
        .await;
    assert_eq!(taken.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(taken).await["error"], "Domain with this name already exists");

    assert!(h.graph.find("CREATE (d:Domain").is_none());
}

#[tokio::test]
async fn test_update_unknown_domain_is_not_found() {
    let h = Harness::new(FakeGraph::default());
    let mut body = domain_body("Cooking");
    body["domainElementId"] = json!("4:d:404");
    body["removedNodeElementIds"] = json!([]);

    let response = h
        .put_secure("/api/secure/graph/update-domain", &body)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(h.graph.find("DETACH DELETE l").is_none());
}

#[tokio::test]
async fn test_update_domain_reports_affected_progress() {
    let h = Harness::new(
        FakeGraph::default()
            .respond(
                "RETURN d.name AS name",
                vec![Record::from_pairs([("name", json!("Cookery"))])],
            )
            .respond(
                "UNWIND $nodeIds",
                vec![Record::from_pairs([("deletedCount", json!(2))])],
            )
            .respond("CREATE (l:Domain_Level", element_id_rows("4:l:2"))
            .respond("MERGE (n:Skill", element_id_rows("4:s:5")),
    );
    let mut body = domain_body("Cooking");
    body["domainElementId"] = json!("4:d:1");
    body["removedNodeElementIds"] = json!(["4:m:3"]);

    let response = h
        .put_secure("/api/secure/graph/update-domain", &body)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["domain"], json!({"elementId": "4:d:1", "name": "Cooking"}));
    assert_eq!(body["affectedUserProgressCount"], 2);
    assert_eq!(body["createdNodes"][0]["elementId"], "4:s:5");

    let progress = h.graph.find("UNWIND $nodeIds").unwrap();
    assert_eq!(progress.get_param("nodeIds"), Some(&json!(["4:m:3"])));
    assert!(h.graph.find("DETACH DELETE l").is_some());
}

#[tokio::test]
async fn test_get_domain_by_name() {
    let domain = json!({
        "elementId": "4:d:1",
        "name": "Cooking",
        "description": "Food and kitchens",
        "levels": [{"elementId": "4:l:1", "level": 1, "name": "Novice", "pointsRequired": 10,
                    "knowledge": [], "skills": [], "traits": [], "milestones": []}]
    });
    let h = Harness::new(FakeGraph::default().respond(
        "MATCH (domain:Domain {name: $name})",
        vec![Record::from_pairs([("result", domain.clone())])],
    ));

    let response = h.get_secure("/api/secure/graph/domain?name=Cooking").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, domain);

    let query = h.graph.find("MATCH (domain:Domain").unwrap();
    assert_eq!(query.get_param("name"), Some(&json!("Cooking")));

    let missing = Harness::new(FakeGraph::default())
        .get_secure("/api/secure/graph/domain?name=Baking")
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validate_domain_name() {
    let h = Harness::new(
        FakeGraph::default().respond("MATCH (d:Domain {name: $name})", element_id_rows("4:d:1")),
    );

    let taken = h
        .get_secure("/api/secure/graph/validate-domain-name?name=Cooking")
        .await;
    assert_eq!(taken.status(), StatusCode::OK);
    assert_eq!(
        json_body(taken).await,
        json!({"available": false, "existingDomainElementId": "4:d:1"})
    );

    let free = Harness::new(FakeGraph::default())
        .get_secure("/api/secure/graph/validate-domain-name?name=Baking")
        .await;
    assert_eq!(json_body(free).await, json!({"available": true}));

    let blank = h
        .get_secure("/api/secure/graph/validate-domain-name")
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Helper and profile routes
// ============================================================================

#[tokio::test]
async fn test_s3_upload_then_fetch() {
    let h = Harness::new(FakeGraph::default());
    let boundary = "atlasboundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(&PNG);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let upload = h
        .send(
            Request::post("/api/secure/helper/s3-upload?key=avatars/ada.png")
                .header(header::AUTHORIZATION, format!("Bearer {}", h.token("ada")))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(upload.status(), StatusCode::OK);
    assert_eq!(json_body(upload).await, json!("File uploaded successfully"));

    let fetched = h
        .get_secure("/api/secure/helper/s3-object?key=avatars/ada.png")
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(fetched.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(fetched.headers()[header::CACHE_CONTROL], "public, max-age=3600");
    let bytes = to_bytes(fetched.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), PNG.as_slice());
}

#[tokio::test]
async fn test_s3_upload_without_file_field_is_bad_request() {
    let h = Harness::new(FakeGraph::default());
    let boundary = "atlasboundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{boundary}--\r\n"
    );

    let response = h
        .send(
            Request::post("/api/secure/helper/s3-upload?key=a.txt")
                .header(header::AUTHORIZATION, format!("Bearer {}", h.token("ada")))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No file provided");
}

#[tokio::test]
async fn test_s3_object_missing_key_is_bad_request() {
    let h = Harness::new(FakeGraph::default());

    let missing_key = h.get_secure("/api/secure/helper/s3-object").await;
    assert_eq!(missing_key.status(), StatusCode::BAD_REQUEST);

    let unknown = h.get_secure("/api/secure/helper/s3-object?key=nope").await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_embedding_helper() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .post_secure("/api/secure/helper/embedding", &json!({"text": "rust"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"embedding": [0.1, 0.2, 0.3]}));

    let blank = h
        .post_secure("/api/secure/helper/embedding", &json!({"text": "  "}))
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_profile_hides_password() {
    let person = json!({
        "Id": 1,
        "ElementId": "4:x:1",
        "Labels": ["Person", "L3"],
        "Props": {"username": "ada", "password": "$argon2id$hash", "phone": "555-0100"},
    });
    let h = Harness::new(FakeGraph::default().respond(
        "MATCH (node:Person)",
        vec![Record::from_pairs([
            ("node", person),
            ("relationships", json!([])),
            ("affiliatedNodes", json!([node("4:x:7", "Rust", json!({}))])),
        ])],
    ));

    let response = h
        .get_secure("/api/secure/profile/user-profile/ada")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let props = &body[0]["Values"][0]["Props"];
    assert_eq!(props["username"], "ada");
    assert!(props.get("password").is_none());
    assert_eq!(body[0]["Values"][2][0]["Props"]["name"], "Rust");
}

#[tokio::test]
async fn test_user_profile_unknown_user_is_not_found() {
    let h = Harness::new(FakeGraph::default());

    let response = h
        .get_secure("/api/secure/profile/user-profile/ghost")
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_graph_failure_is_internal_error() {
    let h = Harness::new(FakeGraph::default().fail_on("MATCH (node"));

    let response = h.get_secure("/api/secure/graph/get-nodes").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "internal server error");
}
