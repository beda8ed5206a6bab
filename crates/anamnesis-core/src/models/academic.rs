use serde::{Deserialize, Serialize};

/// Literature summary for one diagnosis, grounded on web search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademicSearchResult {
    #[serde(rename = "resumoDoenca", default)]
    pub disease_summary: String,
    #[serde(rename = "diretrizesTratamento", default)]
    pub treatment_guidelines: String,
    #[serde(rename = "descobertasRecentes", default)]
    pub recent_findings: String,
    #[serde(default)]
    pub sources: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub web: WebSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    pub uri: String,
    pub title: String,
}
