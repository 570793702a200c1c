/*!
# Error System for Contract Generation

Фатальные ошибки уровня файла (`ContractError`) и нефатальные
диагностики (`Diagnostic`), которые собираются по ходу разбора и
не останавливают обработку остальных файлов.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Ошибка, прерывающая обработку одного файла
#[derive(Debug, Error)]
pub enum ContractError {
    /// Документ не удалось разобрать структурно
    #[error("failed to parse {}: {cause}", path.display())]
    Parse { path: PathBuf, cause: String },

    /// Имя или тип отсутствуют после всех стратегий извлечения
    #[error("{}: missing {what}", path.display())]
    MissingData { path: PathBuf, what: String },

    /// Объект объявляет форму, для которой не найден файл
    #[error("object {object} declares form {form}, but no form file was found")]
    UnresolvedReference { object: String, form: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContractError {
    pub fn parse(path: &Path, cause: impl fmt::Display) -> Self {
        ContractError::Parse {
            path: path.to_path_buf(),
            cause: cause.to_string(),
        }
    }

    pub fn missing(path: &Path, what: impl Into<String>) -> Self {
        ContractError::MissingData {
            path: path.to_path_buf(),
            what: what.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ContractError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type ContractResult<T> = std::result::Result<T, ContractError>;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorLevel {
    Error,
    Warning,
    Info,
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLevel::Error => write!(f, "ERROR"),
            ErrorLevel::Warning => write!(f, "WARNING"),
            ErrorLevel::Info => write!(f, "INFO"),
        }
    }
}

/// Вид нефатальной находки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Глубина строки отчета выросла больше чем на один уровень
    MalformedDepth,
    /// Свойство (`Тип:`, `Комментарий:`) встретилось до первого узла
    OrphanProperty,
    /// Повтор имени внутри одной области видимости
    DuplicateName,
    MissingData,
    UnresolvedReference,
    CategoryUnknown,
}

/// Нефатальная диагностика с привязкой к файлу и строке
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: ErrorLevel,
    pub kind: DiagnosticKind,
    pub message: String,
    pub path: Option<PathBuf>,
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            level: ErrorLevel::Warning,
            kind,
            message: message.into(),
            path: None,
            line: None,
        }
    }

    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.level)?;
        if let Some(path) = &self.path {
            write!(f, "{}", path.display())?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
            write!(f, ": ")?;
        } else if let Some(line) = self.line {
            write!(f, "line {}: ", line)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Diagnostic collection and reporting
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollector {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Diagnostic::warning(kind, message));
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == ErrorLevel::Warning)
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Проставляет путь файла всем диагностикам без пути
    pub fn attach_path(&mut self, path: &Path) {
        for diagnostic in &mut self.diagnostics {
            if diagnostic.path.is_none() {
                diagnostic.path = Some(path.to_path_buf());
            }
        }
    }

    pub fn merge(&mut self, other: DiagnosticCollector) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl fmt::Display for DiagnosticCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
