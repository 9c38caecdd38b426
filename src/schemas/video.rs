use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{FreeVideo, Video};
use crate::db::types::{Track, VideoSource};
use crate::repositories::free_videos::FreeVideoFields;
use crate::repositories::videos::VideoFields;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct VideoPayload {
    #[validate(custom(function = "crate::api::validation::not_blank"))]
    pub(crate) title: String,
    #[validate(range(min = 1, max = 3, message = "grade must be 1, 2 or 3"))]
    pub(crate) grade: i32,
    #[serde(default)]
    pub(crate) track: Track,
    #[serde(alias = "dailymotionId")]
    #[validate(custom(function = "crate::api::validation::not_blank"))]
    pub(crate) dailymotion_id: String,
    #[serde(default)]
    pub(crate) unit: Option<String>,
    #[serde(default)]
    pub(crate) lesson: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

impl VideoPayload {
    pub(crate) fn into_fields(self) -> VideoFields {
        VideoFields {
            title: self.title,
            grade: self.grade,
            track: Track::for_grade(self.grade, self.track),
            dailymotion_id: self.dailymotion_id,
            unit: self.unit,
            lesson: self.lesson,
            description: self.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) grade: i32,
    pub(crate) track: Track,
    pub(crate) dailymotion_id: String,
    pub(crate) unit: Option<String>,
    pub(crate) lesson: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl VideoResponse {
    pub(crate) fn from_db(video: Video) -> Self {
        Self {
            id: video.id,
            title: video.title,
            grade: video.grade,
            track: video.track,
            dailymotion_id: video.dailymotion_id,
            unit: video.unit,
            lesson: video.lesson,
            description: video.description,
            created_at: format_primitive(video.created_at),
            updated_at: format_primitive(video.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct FreeVideoPayload {
    #[validate(custom(function = "crate::api::validation::not_blank"))]
    pub(crate) title: String,
    #[serde(alias = "youtubeId")]
    #[validate(custom(function = "crate::api::validation::not_blank"))]
    pub(crate) youtube_id: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default, alias = "sourceType")]
    pub(crate) source_type: VideoSource,
}

impl FreeVideoPayload {
    pub(crate) fn into_fields(self) -> FreeVideoFields {
        FreeVideoFields {
            title: self.title,
            youtube_id: self.youtube_id,
            description: self.description,
            source_type: self.source_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct FreeVideoResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) youtube_id: String,
    pub(crate) description: Option<String>,
    pub(crate) source_type: VideoSource,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl FreeVideoResponse {
    pub(crate) fn from_db(video: FreeVideo) -> Self {
        Self {
            id: video.id,
            title: video.title,
            youtube_id: video.youtube_id,
            description: video.description,
            source_type: video.source_type,
            created_at: format_primitive(video.created_at),
            updated_at: format_primitive(video.updated_at),
        }
    }
}
