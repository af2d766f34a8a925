//! Uploaded files and the keys they are stored under

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assessment::ArtifactRef;
use crate::error::{Error, Result};

const MB: usize = 1024 * 1024;

/// Files owned by an assessment row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssessmentFile {
    /// Participant's presentation deck, uploaded with a submission
    Presentation,
    /// Rendered from the participant's answers
    Questionnaire,
    /// Official memo uploaded by an administrator
    NotaDinas,
}

impl AssessmentFile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Presentation => "presentation",
            Self::Questionnaire => "questionnaire",
            Self::NotaDinas => "nota-dinas",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "presentation" => Some(Self::Presentation),
            "questionnaire" => Some(Self::Questionnaire),
            "nota-dinas" => Some(Self::NotaDinas),
            _ => None,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Self::Presentation => "presentations",
            Self::Questionnaire => "questionnaires",
            Self::NotaDinas => "memos",
        }
    }

    /// Extensions accepted for uploads; questionnaires are never uploaded
    fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Presentation => &["ppt", "pptx"],
            Self::NotaDinas => &["pdf"],
            Self::Questionnaire => &[],
        }
    }

    fn max_bytes(&self) -> usize {
        match self {
            Self::Presentation => 10 * MB,
            Self::NotaDinas | Self::Questionnaire => 5 * MB,
        }
    }
}

impl std::fmt::Display for AssessmentFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file as received from a client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Upload {
    /// Client-side name; only its extension is kept
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Check type and size, returning the normalized extension
    pub(crate) fn validate(&self, kind: AssessmentFile) -> Result<&'static str> {
        let accepted = kind.accepted_extensions();
        if accepted.is_empty() {
            return Err(Error::Validation(format!("{kind} files cannot be uploaded")));
        }
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .and_then(|ext| accepted.iter().copied().find(|a| *a == ext));
        let Some(extension) = extension else {
            return Err(Error::Validation(format!(
                "Only {} files are allowed for {kind}",
                accepted.join("/").to_uppercase()
            )));
        };
        if self.bytes.is_empty() {
            return Err(Error::Validation(format!("{kind} file is empty")));
        }
        if self.bytes.len() > kind.max_bytes() {
            return Err(Error::Validation(format!(
                "{kind} file exceeds {} MB",
                kind.max_bytes() / MB
            )));
        }
        Ok(extension)
    }

    /// Store key scoped to the owning assessment. Nothing the client sent
    /// ends up in it apart from the checked extension.
    pub(crate) fn key(kind: AssessmentFile, assessment_id: &str, extension: &str) -> String {
        format!(
            "{}/{assessment_id}/{}.{extension}",
            kind.prefix(),
            Uuid::new_v4().simple()
        )
    }
}

/// Bytes of a stored artifact together with its reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub artifact: ArtifactRef,
    pub bytes: Vec<u8>,
}
