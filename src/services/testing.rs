//! In-process doubles for service tests.

use crate::embedding::Embedder;
use crate::imaging::ImageGenerator;
use crate::models::Record;
use crate::storage::{CypherQuery, GraphStore};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// Graph store that answers by matching query text against scripted
/// fragments and records every statement it receives.
#[derive(Default)]
pub struct ScriptedGraphStore {
    responses: Mutex<Vec<(String, Vec<Record>)>>,
    failures: Mutex<Vec<String>>,
    executed: Mutex<Vec<CypherQuery>>,
}

impl ScriptedGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers queries containing `fragment` with `records`. The first
    /// matching script wins.
    pub fn respond(self, fragment: &str, records: Vec<Record>) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push((fragment.to_string(), records));
        self
    }

    /// Fails queries containing `fragment`.
    pub fn fail_on(self, fragment: &str) -> Self {
        self.failures
            .lock()
            .expect("failures lock")
            .push(fragment.to_string());
        self
    }

    pub fn executed(&self) -> Vec<CypherQuery> {
        self.executed.lock().expect("executed lock").clone()
    }

    pub fn find(&self, fragment: &str) -> Option<CypherQuery> {
        self.executed()
            .into_iter()
            .find(|query| query.text.contains(fragment))
    }
}

#[async_trait]
impl GraphStore for ScriptedGraphStore {
    async fn execute(&self, query: CypherQuery) -> Result<Vec<Record>> {
        self.executed
            .lock()
            .expect("executed lock")
            .push(query.clone());

        let failing = self
            .failures
            .lock()
            .expect("failures lock")
            .iter()
            .any(|fragment| query.text.contains(fragment.as_str()));
        if failing {
            return Err(Error::operation("neo4j_execute", "scripted failure"));
        }

        Ok(self
            .responses
            .lock()
            .expect("responses lock")
            .iter()
            .find(|(fragment, _)| query.text.contains(fragment.as_str()))
            .map(|(_, records)| records.clone())
            .unwrap_or_default())
    }
}

/// Embedder returning a fixed vector and remembering its inputs.
#[derive(Default)]
pub struct FixedEmbedder {
    pub vector: Vec<f64>,
    pub seen: Mutex<Vec<String>>,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f64>) -> Self {
        Self {
            vector,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    fn dimensions(&self) -> usize {
        self.vector.len()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        self.seen.lock().expect("seen lock").push(text.to_string());
        Ok(self.vector.clone())
    }
}

/// Image generator returning a fixed PNG header.
#[derive(Default)]
pub struct FixedImageGenerator {
    pub prompts: Mutex<Vec<String>>,
}

pub const PNG_BYTES: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[async_trait]
impl ImageGenerator for FixedImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());
        Ok(PNG_BYTES.to_vec())
    }
}
