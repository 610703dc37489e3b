use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TechniqueName;

/// A technique detail page was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueView {
    pub name: TechniqueName,
    pub timestamp: DateTime<Utc>,
}

impl TechniqueView {
    #[must_use]
    pub fn new(name: TechniqueName, timestamp: DateTime<Utc>) -> Self {
        Self { name, timestamp }
    }
}
