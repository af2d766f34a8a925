//! Document generation for questionnaires and evaluation sheets

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::artifacts::ArtifactStore;
use crate::error::CollaboratorError;
use crate::model::{Answers, ArtifactRef, PersonSummary, Scores};

/// Structured content of a participant's questionnaire
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireDocument {
    pub assessment_id: String,
    pub title: String,
    pub projection: String,
    pub participant: Option<PersonSummary>,
    pub answers: Answers,
}

/// Structured content of one evaluator's sheet
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDocument {
    pub evaluation_id: String,
    pub assessment_id: String,
    pub participant: Option<PersonSummary>,
    pub projection: String,
    pub schedule: Option<DateTime<Utc>>,
    pub scores: Scores,
    pub recommendation: Option<String>,
    pub evaluator: Option<PersonSummary>,
}

/// Renders structured data into a stored document.
///
/// Each call produces a fresh artifact; callers release the previous one.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_questionnaire(
        &self,
        document: &QuestionnaireDocument,
    ) -> Result<ArtifactRef, CollaboratorError>;

    async fn render_evaluation(
        &self,
        document: &EvaluationDocument,
    ) -> Result<ArtifactRef, CollaboratorError>;
}

/// Writes each document as pretty-printed JSON into an [`ArtifactStore`]
pub struct JsonDocumentRenderer {
    artifacts: Arc<dyn ArtifactStore>,
}

impl JsonDocumentRenderer {
    pub fn new(artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { artifacts }
    }

    async fn write<T: Serialize + Sync>(
        &self,
        kind: &str,
        owner: &str,
        document: &T,
    ) -> Result<ArtifactRef, CollaboratorError> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| CollaboratorError::Render(e.to_string()))?;
        let key = format!("{kind}/{owner}-{}.json", Uuid::new_v4().simple());
        self.artifacts.put(&key, bytes).await
    }
}

#[async_trait]
impl DocumentRenderer for JsonDocumentRenderer {
    async fn render_questionnaire(
        &self,
        document: &QuestionnaireDocument,
    ) -> Result<ArtifactRef, CollaboratorError> {
        self.write("questionnaires", &document.assessment_id, document)
            .await
    }

    async fn render_evaluation(
        &self,
        document: &EvaluationDocument,
    ) -> Result<ArtifactRef, CollaboratorError> {
        self.write("evaluations", &document.evaluation_id, document)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MemoryArtifactStore;
    use crate::model::{Grade, Rating};

    #[tokio::test]
    async fn evaluation_sheet_is_stored_as_json() {
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let renderer = JsonDocumentRenderer::new(artifacts.clone());

        let mut scores = Scores::new();
        scores.insert(
            "integrity".into(),
            Rating {
                rating: Grade::B,
                notes: Some("Consistent".into()),
            },
        );
        let document = EvaluationDocument {
            evaluation_id: "e1".into(),
            assessment_id: "a1".into(),
            participant: None,
            projection: "SUPERVISOR".into(),
            schedule: None,
            scores,
            recommendation: Some("Ready".into()),
            evaluator: None,
        };

        let artifact = renderer.render_evaluation(&document).await.unwrap();
        assert!(artifact.as_str().starts_with("evaluations/e1-"));

        let stored: serde_json::Value =
            serde_json::from_slice(&artifacts.get(&artifact).await.unwrap()).unwrap();
        assert_eq!(stored["scores"]["integrity"]["rating"], "B");
        assert_eq!(stored["recommendation"], "Ready");
    }

    #[tokio::test]
    async fn every_render_gets_a_fresh_key() {
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let renderer = JsonDocumentRenderer::new(artifacts.clone());
        let document = QuestionnaireDocument {
            assessment_id: "a1".into(),
            title: "Fit and proper".into(),
            projection: "MANAGER".into(),
            participant: None,
            answers: Answers::new(),
        };

        let first = renderer.render_questionnaire(&document).await.unwrap();
        let second = renderer.render_questionnaire(&document).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(artifacts.len().await, 2);
    }
}
