use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::ProjectId;

/// The aggregate that owns a gallery. Only its identity matters to the image
/// pipeline; editing the text fields happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}
