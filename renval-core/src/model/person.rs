//! People known to the assessment workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::SystemRole;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Invitation recipient address
    pub phone: Option<String>,
    /// Employee number
    pub nip: String,
    pub position: Option<String>,
    pub division: Option<String>,
    pub system_role: SystemRole,
    pub created_at: DateTime<Utc>,
}

impl Person {
    pub fn summary(&self) -> PersonSummary {
        PersonSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            nip: self.nip.clone(),
            position: self.position.clone(),
            division: self.division.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub nip: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub system_role: SystemRole,
}

impl NewPerson {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().len() < 2 {
            return Err(Error::Validation(
                "Name must be at least 2 characters".into(),
            ));
        }
        if !self.email.contains('@') {
            return Err(Error::Validation(
                "Please provide a valid email address".into(),
            ));
        }
        if self.nip.trim().len() < 5 {
            return Err(Error::Validation("NIP must be at least 5 characters".into()));
        }
        Ok(())
    }
}

/// Public subset of a person embedded in assessment projections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub nip: String,
    pub position: Option<String>,
    pub division: Option<String>,
}
