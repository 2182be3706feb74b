use crate::models::generation_request::{GenerationRequest, QuestionSource};
use crate::models::record::{header_line, LanguageFilter};
use crate::services::reconciler::NOT_FOUND_SENTINEL;

const RULES: &str = r#"**Important Notes:**
- Ensure all fields are populated correctly; if a field is not applicable, leave it blank.
- Do not include any text before or after the CSV content.
- Wrap any field that contains a comma, a quote or a line break in double quotes.
- Do not invent PDF names; use the exact names from the Knowledge Base.
- Provide accurate page numbers and original question numbers from the PDFs.
- The Correct Answer columns must contain the full text of the correct option, not just its letter.
- Explanations should be detailed, at least 2-3 paragraphs, and say why the other options are not suitable.
- Use only information that can be directly verified from the Knowledge Base."#;

fn list_or_any(values: &[String]) -> String {
    let picked: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if picked.is_empty() {
        "Any".to_string()
    } else {
        picked.join(", ")
    }
}

fn text_or_any(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "Any"
    } else {
        trimmed
    }
}

fn language_directive(language: LanguageFilter) -> &'static str {
    match language {
        LanguageFilter::English => {
            "Write every question in English only. Leave all (Hindi) columns blank."
        }
        LanguageFilter::Hindi => {
            "Write every question in Hindi only. Leave all (English) columns blank."
        }
        LanguageFilter::Both => {
            "Write every question in both English and Hindi, filling the (English) and (Hindi) columns with equivalent text."
        }
    }
}

fn source_directive(source: QuestionSource) -> &'static str {
    match source {
        QuestionSource::Original => {
            "Use only original questions exactly as they appear in the Knowledge Base PDFs, with their page number, question number and year."
        }
        QuestionSource::AiGenerated => {
            "Write new questions in the style of the Knowledge Base PDFs. Source page number, question number and year may be left blank."
        }
        QuestionSource::Mixed => {
            "Mix original questions from the Knowledge Base PDFs with new questions written in their style. Fill the source columns for original questions."
        }
    }
}

/// Renders the instruction sent to the assistant for one batch.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let f = &request.filters;
    let years = match f.year_range {
        Some(range) => format!("{} to {}", range.from, range.to),
        None => "Any".to_string(),
    };

    format!(
        "Generate exactly {count} unique exam-style questions from the Knowledge Base with these parameters:\n\
         - Subjects: {subjects}\n\
         - Topics: {topics}\n\
         - Sub-Topic: {sub_topic}\n\
         - Keywords: {keywords}\n\
         - Question Types: {types}\n\
         - Difficulty Levels: {difficulty}\n\
         - Year Range: {years}\n\
         - Reference PDFs: {pdfs}\n\
         \n\
         Language: {language}\n\
         Question Source: {source}\n\
         \n\
         Return the questions as CSV with exactly this header line and column order:\n\
         {header}\n\
         \n\
         {rules}\n\
         - If no relevant entry is found in the Knowledge Base, respond with: \"{sentinel}.\"\n",
        count = request.count,
        subjects = list_or_any(&f.subjects),
        topics = list_or_any(&f.topics),
        sub_topic = text_or_any(&f.sub_topic),
        keywords = text_or_any(&f.keywords),
        types = list_or_any(&f.question_types),
        difficulty = list_or_any(&f.difficulty_levels),
        years = years,
        pdfs = list_or_any(&f.reference_pdfs),
        language = language_directive(f.language),
        source = source_directive(f.question_source),
        header = header_line(),
        rules = RULES,
        sentinel = NOT_FOUND_SENTINEL,
    )
}
