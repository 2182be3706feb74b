use crate::models::catalog::{DIFFICULTY_LEVELS, PDF_NAMES, QUESTION_TYPES, SUBJECTS, SUB_TOPICS, TOPICS};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub subjects: Vec<&'static str>,
    pub topics: BTreeMap<&'static str, Vec<&'static str>>,
    pub sub_topics: BTreeMap<&'static str, Vec<&'static str>>,
    pub pdfs: BTreeMap<&'static str, Vec<&'static str>>,
    pub question_types: Vec<&'static str>,
    pub difficulty_levels: Vec<&'static str>,
}

fn lookup(table: &'static [(&'static str, &'static [&'static str])], key: &str) -> &'static [&'static str] {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(&[])
}

fn to_map(table: &'static [(&'static str, &'static [&'static str])]) -> BTreeMap<&'static str, Vec<&'static str>> {
    table.iter().map(|(k, v)| (*k, v.to_vec())).collect()
}

pub struct CatalogService;

impl CatalogService {
    pub fn subjects() -> &'static [&'static str] {
        SUBJECTS
    }

    pub fn topics(subject: &str) -> &'static [&'static str] {
        lookup(TOPICS, subject)
    }

    pub fn sub_topics(topic: &str) -> &'static [&'static str] {
        lookup(SUB_TOPICS, topic)
    }

    /// Reference PDFs for a selection: topic PDFs when topics are chosen,
    /// otherwise the subject's own PDFs. Order follows the selection and
    /// names are not repeated.
    pub fn pdfs_for(subjects: &[String], topics: &[String]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut push = |list: &[&str]| {
            for name in list {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        };

        for subject in subjects {
            let chosen: Vec<&String> = topics
                .iter()
                .filter(|t| Self::topics(subject).contains(&t.as_str()))
                .collect();
            if chosen.is_empty() {
                push(lookup(PDF_NAMES, subject));
                for topic in Self::topics(subject) {
                    push(lookup(PDF_NAMES, topic));
                }
            } else {
                for topic in chosen {
                    push(lookup(PDF_NAMES, topic));
                }
            }
        }
        names
    }

    pub fn view() -> CatalogView {
        CatalogView {
            subjects: SUBJECTS.to_vec(),
            topics: to_map(TOPICS),
            sub_topics: to_map(SUB_TOPICS),
            pdfs: to_map(PDF_NAMES),
            question_types: QUESTION_TYPES.to_vec(),
            difficulty_levels: DIFFICULTY_LEVELS.to_vec(),
        }
    }
}
