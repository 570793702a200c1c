//! Поисковые метаданные: категория, полный идентификатор, ключевые слова.

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::SearchInfo;
use crate::configuration::objects::{ConfigurationObject, ObjectKind};
use crate::core::{DiagnosticCollector, DiagnosticKind};

/// Категория для видов вне известной таблицы
pub const UNCATEGORIZED: &str = "uncategorized";

static TASK_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{5,}\b").expect("valid task regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchMetadataEnricher;

impl SearchMetadataEnricher {
    pub fn new() -> Self {
        Self
    }

    /// Папка-категория вида объекта
    pub fn category(kind: &ObjectKind) -> Option<&'static str> {
        kind.info().map(|info| info.xml_folder)
    }

    pub fn enrich(
        &self,
        object: &ConfigurationObject,
        diagnostics: &mut DiagnosticCollector,
    ) -> SearchInfo {
        let category = match Self::category(&object.kind) {
            Some(category) => category.to_string(),
            None => {
                diagnostics.warn(
                    DiagnosticKind::CategoryUnknown,
                    format!("No category for {}, using {}", object.qualified_name(), UNCATEGORIZED),
                );
                UNCATEGORIZED.to_string()
            }
        };

        let comment = object.comment.as_deref().unwrap_or_default();
        let mut keywords = Vec::new();
        let candidates = [object.kind.display_name().to_string(), object.name.clone()]
            .into_iter()
            .chain(comment_tokens(comment));
        for keyword in candidates {
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }

        SearchInfo {
            full_name: format!("{}_{}", category, object.name),
            category,
            keywords,
            tasks: task_numbers(comment),
        }
    }
}

/// Слова комментария: без окружающей пунктуации, в нижнем регистре
pub fn comment_tokens(comment: &str) -> impl Iterator<Item = String> + '_ {
    comment
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|token| !token.is_empty())
}

/// Номера задач (5 и более цифр), без повторов
pub fn task_numbers(comment: &str) -> Vec<String> {
    let mut tasks: Vec<String> = Vec::new();
    for m in TASK_NUMBER.find_iter(comment) {
        if !tasks.iter().any(|t| t == m.as_str()) {
            tasks.push(m.as_str().to_string());
        }
    }
    tasks
}
