//! Shared handles passed into every service

use std::sync::Arc;

use tracing::{info, warn};

use crate::collaborators::{ArtifactStore, DocumentRenderer, NotificationDispatcher};
use crate::error::{CollaboratorError, Error, Result};
use crate::events::{AssessmentEvent, EventBus};
use crate::lifecycle::StatusChange;
use crate::model::{ArtifactRef, AssessmentFile, StoredFile, Upload};
use crate::store::Store;

/// Default upper bound on evaluators per assessment
pub const DEFAULT_MAX_EVALUATORS: usize = 2;

/// Settings the core consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub max_evaluators: usize,
    /// Template name sent with invitations
    pub invitation_template: String,
    /// Link participants are sent to
    pub portal_link: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_evaluators: DEFAULT_MAX_EVALUATORS,
            invitation_template: "fitAndProper".to_string(),
            portal_link: "https://renval.msdm.app/".to_string(),
        }
    }
}

/// External collaborators the services call through
#[derive(Clone)]
pub struct Collaborators {
    pub artifacts: Arc<dyn ArtifactStore>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub events: Arc<dyn EventBus>,
}

pub(crate) struct Context {
    pub(crate) store: Arc<Store>,
    pub(crate) artifacts: Arc<dyn ArtifactStore>,
    pub(crate) renderer: Arc<dyn DocumentRenderer>,
    pub(crate) dispatcher: Arc<dyn NotificationDispatcher>,
    pub(crate) events: Arc<dyn EventBus>,
    pub(crate) config: CoreConfig,
}

impl Context {
    pub(crate) fn new(store: Arc<Store>, collaborators: Collaborators, config: CoreConfig) -> Self {
        Self {
            store,
            artifacts: collaborators.artifacts,
            renderer: collaborators.renderer,
            dispatcher: collaborators.dispatcher,
            events: collaborators.events,
            config,
        }
    }

    pub(crate) async fn publish(&self, event: AssessmentEvent) {
        self.events.publish(event).await;
    }

    /// Log and publish a committed status change
    pub(crate) async fn publish_change(&self, change: Option<StatusChange>) {
        if let Some(change) = change {
            info!(
                assessment_id = %change.assessment_id,
                from = %change.from,
                to = %change.to,
                cause = ?change.cause,
                "Assessment status changed"
            );
            self.publish(AssessmentEvent::StatusChanged {
                assessment_id: change.assessment_id,
                from: change.from,
                to: change.to,
                cause: change.cause,
            })
            .await;
        }
    }

    /// Write an upload under a fresh key owned by `assessment_id`
    pub(crate) async fn store_upload(
        &self,
        kind: AssessmentFile,
        assessment_id: &str,
        upload: &Upload,
    ) -> Result<ArtifactRef> {
        let extension = upload.validate(kind)?;
        let key = Upload::key(kind, assessment_id, extension);
        Ok(self.artifacts.put(&key, upload.bytes.clone()).await?)
    }

    /// Read the bytes behind a stored reference
    pub(crate) async fn fetch(&self, artifact: ArtifactRef) -> Result<StoredFile> {
        match self.artifacts.get(&artifact).await {
            Ok(bytes) => Ok(StoredFile { artifact, bytes }),
            Err(CollaboratorError::ArtifactMissing(_)) => {
                Err(Error::NotFound(format!("File not found: {artifact}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete artifact bytes after the owning rows are gone; failures are
    /// logged, never returned
    pub(crate) async fn release<I>(&self, artifacts: I)
    where
        I: IntoIterator<Item = ArtifactRef>,
    {
        for artifact in artifacts {
            if let Err(e) = self.artifacts.delete(&artifact).await {
                warn!(artifact = %artifact, error = %e, "Failed to delete artifact");
            }
        }
    }
}
