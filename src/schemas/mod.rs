use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub(crate) mod activity;
pub(crate) mod auth;
pub(crate) mod exam;
pub(crate) mod result;
pub(crate) mod student;
pub(crate) mod video;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}

/// Optional grade/track filter shared by admin catalog listings.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CatalogQuery {
    #[serde(default)]
    pub(crate) grade: Option<i32>,
    #[serde(default)]
    pub(crate) track: Option<crate::db::types::Track>,
}
