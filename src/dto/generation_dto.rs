use crate::error::{Error, Result};
use crate::models::generation_request::{GenerationFilters, GenerationRequest, QuestionSource, YearRange};
use crate::models::record::LanguageFilter;
use crate::services::catalog_service::CatalogService;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGenerationPayload {
    #[validate(range(min = 1, message = "At least one question must be requested"))]
    pub num_questions: u32,
    pub subjects: Option<Vec<String>>,
    pub topics: Option<Vec<String>>,
    pub sub_topic: Option<String>,
    pub keywords: Option<String>,
    pub question_types: Option<Vec<String>>,
    pub difficulty_levels: Option<Vec<String>>,
    /// `English`, `Hindi` or `Both`.
    pub language: Option<String>,
    /// `Original`, `AI Generated` or `Mixed`.
    pub question_source: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub year_from: Option<i32>,
    #[validate(range(min = 1900, max = 2100))]
    pub year_to: Option<i32>,
    pub pdfs: Option<Vec<String>>,
}

fn parse_source(raw: &str) -> Result<QuestionSource> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "original" => Ok(QuestionSource::Original),
        "ai generated" | "ai_generated" | "ai" => Ok(QuestionSource::AiGenerated),
        "mixed" | "both" => Ok(QuestionSource::Mixed),
        other => Err(Error::BadRequest(format!("Unknown question source '{}'", other))),
    }
}

impl CreateGenerationPayload {
    /// Builds the run request, clamping the count to `max_questions` and
    /// filling reference PDFs from the catalog when none were given.
    pub fn into_request(self, max_questions: u32) -> Result<GenerationRequest> {
        let language = match self.language.as_deref() {
            Some(raw) => raw.parse::<LanguageFilter>().map_err(Error::BadRequest)?,
            None => LanguageFilter::default(),
        };
        let question_source = match self.question_source.as_deref() {
            Some(raw) => parse_source(raw)?,
            None => QuestionSource::default(),
        };
        let year_range = match (self.year_from, self.year_to) {
            (None, None) => None,
            (from, to) => {
                let from = from.unwrap_or(1900);
                let to = to.unwrap_or(2100);
                if from > to {
                    return Err(Error::BadRequest("year_from must not be after year_to".to_string()));
                }
                Some(YearRange { from, to })
            }
        };

        let subjects = self.subjects.unwrap_or_default();
        let topics = self.topics.unwrap_or_default();
        let reference_pdfs = match self.pdfs {
            Some(pdfs) if !pdfs.is_empty() => pdfs,
            _ => CatalogService::pdfs_for(&subjects, &topics),
        };

        let count = self.num_questions.min(max_questions.max(1)) as usize;
        Ok(GenerationRequest::new(
            count,
            GenerationFilters {
                subjects,
                topics,
                sub_topic: self.sub_topic.unwrap_or_default(),
                keywords: self.keywords.unwrap_or_default(),
                question_types: self.question_types.unwrap_or_default(),
                difficulty_levels: self.difficulty_levels.unwrap_or_default(),
                language,
                question_source,
                year_range,
                reference_pdfs,
            },
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub language: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobQuery {
    pub include_records: Option<bool>,
}
