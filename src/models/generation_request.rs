use crate::models::record::LanguageFilter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionSource {
    /// Questions lifted from the reference documents with page and number.
    #[default]
    Original,
    /// New questions written in the style of the reference documents.
    #[serde(rename = "AI Generated")]
    AiGenerated,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub from: i32,
    pub to: i32,
}

/// Caller-chosen constraints shared by every batch of one run. Empty means
/// unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFilters {
    pub subjects: Vec<String>,
    pub topics: Vec<String>,
    pub sub_topic: String,
    pub keywords: String,
    pub question_types: Vec<String>,
    pub difficulty_levels: Vec<String>,
    pub language: LanguageFilter,
    pub question_source: QuestionSource,
    pub year_range: Option<YearRange>,
    pub reference_pdfs: Vec<String>,
}

/// One batch worth of work handed to the generation client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub count: usize,
    pub filters: GenerationFilters,
}

impl GenerationRequest {
    pub fn new(count: usize, filters: GenerationFilters) -> Self {
        Self { count, filters }
    }

    pub fn for_batch(&self, count: usize) -> Self {
        Self {
            count,
            filters: self.filters.clone(),
        }
    }
}
