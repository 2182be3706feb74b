use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Hindi,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Hindi];

    pub fn suffix(self) -> &'static str {
        match self {
            Language::English => "(English)",
            Language::Hindi => "(Hindi)",
        }
    }

    fn index(self) -> usize {
        match self {
            Language::English => 0,
            Language::Hindi => 1,
        }
    }
}

/// Which language-suffixed columns a caller wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageFilter {
    English,
    Hindi,
    #[default]
    Both,
}

impl LanguageFilter {
    pub fn includes(self, language: Language) -> bool {
        matches!(
            (self, language),
            (LanguageFilter::Both, _)
                | (LanguageFilter::English, Language::English)
                | (LanguageFilter::Hindi, Language::Hindi)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageFilter::English => "English",
            LanguageFilter::Hindi => "Hindi",
            LanguageFilter::Both => "Both",
        }
    }
}

impl std::str::FromStr for LanguageFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" => Ok(LanguageFilter::English),
            "hindi" => Ok(LanguageFilter::Hindi),
            "both" | "" => Ok(LanguageFilter::Both),
            other => Err(format!("unknown language '{}'", other)),
        }
    }
}

/// One column of the question table, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Subject,
    Topic,
    SubTopic,
    QuestionType,
    QuestionText(Language),
    Option(Language, usize),
    CorrectAnswer(Language),
    Explanation(Language),
    DifficultyLevel,
    Language,
    SourcePdfName,
    SourcePageNumber,
    OriginalQuestionNumber,
    YearOfOriginalQuestion,
}

pub const COLUMN_COUNT: usize = 24;

pub const COLUMNS: [Column; COLUMN_COUNT] = [
    Column::Subject,
    Column::Topic,
    Column::SubTopic,
    Column::QuestionType,
    Column::QuestionText(Language::English),
    Column::QuestionText(Language::Hindi),
    Column::Option(Language::English, 0),
    Column::Option(Language::English, 1),
    Column::Option(Language::English, 2),
    Column::Option(Language::English, 3),
    Column::Option(Language::Hindi, 0),
    Column::Option(Language::Hindi, 1),
    Column::Option(Language::Hindi, 2),
    Column::Option(Language::Hindi, 3),
    Column::CorrectAnswer(Language::English),
    Column::CorrectAnswer(Language::Hindi),
    Column::Explanation(Language::English),
    Column::Explanation(Language::Hindi),
    Column::DifficultyLevel,
    Column::Language,
    Column::SourcePdfName,
    Column::SourcePageNumber,
    Column::OriginalQuestionNumber,
    Column::YearOfOriginalQuestion,
];

const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

impl Column {
    pub fn header(self) -> String {
        match self {
            Column::Subject => "Subject".to_string(),
            Column::Topic => "Topic".to_string(),
            Column::SubTopic => "Sub-Topic".to_string(),
            Column::QuestionType => "Question Type".to_string(),
            Column::QuestionText(lang) => format!("Question Text {}", lang.suffix()),
            Column::Option(lang, idx) => {
                format!("Option {} {}", OPTION_LETTERS[idx % 4], lang.suffix())
            }
            Column::CorrectAnswer(lang) => format!("Correct Answer {}", lang.suffix()),
            Column::Explanation(lang) => format!("Explanation {}", lang.suffix()),
            Column::DifficultyLevel => "Difficulty Level".to_string(),
            Column::Language => "Language".to_string(),
            Column::SourcePdfName => "Source PDF Name".to_string(),
            Column::SourcePageNumber => "Source Page Number".to_string(),
            Column::OriginalQuestionNumber => "Original Question Number".to_string(),
            Column::YearOfOriginalQuestion => "Year of Original Question".to_string(),
        }
    }

    pub fn language(self) -> Option<Language> {
        match self {
            Column::QuestionText(lang)
            | Column::Option(lang, _)
            | Column::CorrectAnswer(lang)
            | Column::Explanation(lang) => Some(lang),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Column::SourcePageNumber
                | Column::OriginalQuestionNumber
                | Column::YearOfOriginalQuestion
        )
    }
}

/// The full header line in wire order, comma separated.
pub fn header_line() -> String {
    COLUMNS
        .iter()
        .map(|c| c.header())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bilingual {
    pub english: String,
    pub hindi: String,
}

impl Bilingual {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::English => &self.english,
            Language::Hindi => &self.hindi,
        }
    }

    fn slot(&mut self, language: Language) -> &mut String {
        match language {
            Language::English => &mut self.english,
            Language::Hindi => &mut self.hindi,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub subject: String,
    pub topic: String,
    pub sub_topic: String,
    pub question_type: String,
    pub question_text: Bilingual,
    pub options: [Bilingual; 4],
    pub correct_answer: Bilingual,
    pub explanation: Bilingual,
    pub difficulty_level: String,
    pub language: String,
    pub source_pdf_name: String,
    pub source_page_number: i64,
    pub original_question_number: i64,
    pub year_of_original_question: i64,
}

/// Per-language question text, used to detect duplicates across batches.
pub type DedupKey = [String; 2];

impl Record {
    /// Assigns one raw cell. Numeric columns fall back to 0 on bad input.
    pub fn set(&mut self, column: Column, raw: &str) {
        let value = raw.trim();
        match column {
            Column::Subject => self.subject = value.to_string(),
            Column::Topic => self.topic = value.to_string(),
            Column::SubTopic => self.sub_topic = value.to_string(),
            Column::QuestionType => self.question_type = value.to_string(),
            Column::QuestionText(lang) => *self.question_text.slot(lang) = value.to_string(),
            Column::Option(lang, idx) => *self.options[idx % 4].slot(lang) = value.to_string(),
            Column::CorrectAnswer(lang) => *self.correct_answer.slot(lang) = value.to_string(),
            Column::Explanation(lang) => *self.explanation.slot(lang) = value.to_string(),
            Column::DifficultyLevel => self.difficulty_level = value.to_string(),
            Column::Language => self.language = value.to_string(),
            Column::SourcePdfName => self.source_pdf_name = value.to_string(),
            Column::SourcePageNumber => self.source_page_number = coerce_int(value),
            Column::OriginalQuestionNumber => self.original_question_number = coerce_int(value),
            Column::YearOfOriginalQuestion => self.year_of_original_question = coerce_int(value),
        }
    }

    pub fn value(&self, column: Column) -> String {
        match column {
            Column::Subject => self.subject.clone(),
            Column::Topic => self.topic.clone(),
            Column::SubTopic => self.sub_topic.clone(),
            Column::QuestionType => self.question_type.clone(),
            Column::QuestionText(lang) => self.question_text.get(lang).to_string(),
            Column::Option(lang, idx) => self.options[idx % 4].get(lang).to_string(),
            Column::CorrectAnswer(lang) => self.correct_answer.get(lang).to_string(),
            Column::Explanation(lang) => self.explanation.get(lang).to_string(),
            Column::DifficultyLevel => self.difficulty_level.clone(),
            Column::Language => self.language.clone(),
            Column::SourcePdfName => self.source_pdf_name.clone(),
            Column::SourcePageNumber => self.source_page_number.to_string(),
            Column::OriginalQuestionNumber => self.original_question_number.to_string(),
            Column::YearOfOriginalQuestion => self.year_of_original_question.to_string(),
        }
    }

    pub fn numeric_value(&self, column: Column) -> Option<i64> {
        match column {
            Column::SourcePageNumber => Some(self.source_page_number),
            Column::OriginalQuestionNumber => Some(self.original_question_number),
            Column::YearOfOriginalQuestion => Some(self.year_of_original_question),
            _ => None,
        }
    }

    pub fn option_count(&self, language: Language) -> usize {
        self.options
            .iter()
            .filter(|o| !o.get(language).is_empty())
            .count()
    }

    /// A record is usable when it carries a question in some language or at
    /// least two options in some language.
    pub fn is_viable(&self) -> bool {
        let has_question = Language::ALL
            .iter()
            .any(|lang| !self.question_text.get(*lang).is_empty());
        let has_options = Language::ALL
            .iter()
            .any(|lang| self.option_count(*lang) >= 2);
        has_question || has_options
    }

    pub fn dedup_key(&self) -> DedupKey {
        let mut key: DedupKey = Default::default();
        for lang in Language::ALL {
            key[lang.index()] = self.question_text.get(lang).to_string();
        }
        key
    }
}

fn coerce_int(raw: &str) -> i64 {
    let cleaned = raw.trim().trim_matches('"').trim();
    if let Ok(v) = cleaned.parse::<i64>() {
        return v;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v.trunc() as i64,
        _ => 0,
    }
}
