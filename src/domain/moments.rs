use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded "moment" row as stored in the `moments` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentRecord {
    pub id: String,
    pub child_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A moment with short-lived URLs attached for playback.
///
/// Either URL is `None` when the source reference was absent or could not be
/// signed; the two are resolved independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMoment {
    #[serde(flatten)]
    pub moment: MomentRecord,
    #[serde(rename = "signedVideoUrl")]
    pub signed_video_url: Option<String>,
    #[serde(rename = "signedThumbnailUrl")]
    pub signed_thumbnail_url: Option<String>,
}
