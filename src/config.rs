/*!
# Generator Settings

Настройки генерации контрактов. Загружаются из TOML (`.toml`) или YAML
(`.yaml`/`.yml`), у каждого поля есть значение по умолчанию, флаги
командной строки перекрывают значения из файла.

```toml
conf_dir = "conf_files"
output_dir = "metadata_contracts"
skip_forms = false

[[extra_type_rules]]
pattern = { prefix = "cfg:BotRef." }
replacement = "БотСсылка."
```
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::configuration::report_parser::DEFAULT_INDENT_WIDTH;
use crate::configuration::type_normalizer::{TypeNormalizer, TypeRule};

pub const DEFAULT_OUTPUT_DIR: &str = "metadata_contracts";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Текстовый отчет по конфигурации
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,

    /// Каталог выгрузки конфигурации в XML
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conf_dir: Option<PathBuf>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub skip_metadata: bool,

    #[serde(default)]
    pub skip_forms: bool,

    /// Удалять старые `*.json` из каталога результата перед записью
    #[serde(default = "default_true")]
    pub clean_output: bool,

    /// Остановиться на первой фатальной ошибке файла
    #[serde(default)]
    pub fail_fast: bool,

    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Искать отчет в `conf_dir`, если `report_path` не задан
    #[serde(default)]
    pub discover_report: bool,

    #[serde(default = "default_indent_width")]
    pub indent_width: usize,

    /// Дополнительные правила нормализации типов, проверяются раньше встроенных
    #[serde(default)]
    pub extra_type_rules: Vec<TypeRule>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_true() -> bool {
    true
}

fn default_indent_width() -> usize {
    DEFAULT_INDENT_WIDTH
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            report_path: None,
            conf_dir: None,
            output_dir: default_output_dir(),
            skip_metadata: false,
            skip_forms: false,
            clean_output: true,
            fail_fast: false,
            pretty: true,
            discover_report: false,
            indent_width: DEFAULT_INDENT_WIDTH,
            extra_type_rules: Vec::new(),
        }
    }
}

impl GeneratorSettings {
    /// Загрузка по расширению файла: YAML для `.yaml`/`.yml`, иначе TOML
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let settings: Self = if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML settings from {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML settings from {}", path.display()))?
        };

        for warning in settings.validate() {
            tracing::warn!("{}: {}", path.display(), warning);
        }
        Ok(settings)
    }

    /// Save settings to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write settings to {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Нефатальные замечания к настройкам
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.indent_width == 0 {
            warnings.push("indent_width is 0, one column per level will be used".to_string());
        }
        if self.skip_metadata && self.skip_forms {
            warnings.push(
                "Both metadata and forms are skipped, nothing will be generated".to_string(),
            );
        }
        if self.report_path.is_none() && self.conf_dir.is_none() {
            warnings.push("Neither report_path nor conf_dir is set".to_string());
        }
        if self.skip_metadata && self.conf_dir.is_none() && !self.skip_forms {
            warnings.push("Form contracts need conf_dir".to_string());
        }

        warnings
    }

    pub fn normalizer(&self) -> TypeNormalizer {
        TypeNormalizer::with_extra_rules(self.extra_type_rules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = GeneratorSettings::default();
        assert_eq!(settings.output_dir, PathBuf::from("metadata_contracts"));
        assert!(settings.clean_output);
        assert!(!settings.fail_fast);
        assert_eq!(settings.indent_width, 4);
    }

    #[test]
    fn test_toml_with_extra_rules() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
conf_dir = "conf_files"
skip_forms = true

[[extra_type_rules]]
pattern = { prefix = "cfg:BotRef." }
replacement = "БотСсылка."
"#,
        )
        .unwrap();

        let settings = GeneratorSettings::load_from_file(&path).unwrap();
        assert_eq!(settings.conf_dir, Some(PathBuf::from("conf_files")));
        assert!(settings.skip_forms);
        assert!(settings.clean_output);
        assert_eq!(settings.normalizer().normalize("cfg:BotRef.Телеграм"), "БотСсылка.Телеграм");
    }

    #[test]
    fn test_yaml_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yml");
        let yaml = "report_path: report.txt\nfail_fast: true\nindent_width: 2\n";
        std::fs::write(&path, yaml).unwrap();

        let settings = GeneratorSettings::load_from_file(&path).unwrap();
        assert_eq!(settings.report_path, Some(PathBuf::from("report.txt")));
        assert!(settings.fail_fast);
        assert_eq!(settings.indent_width, 2);
    }

    #[test]
    fn test_toml_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        let settings = GeneratorSettings {
            conf_dir: Some(PathBuf::from("conf")),
            ..GeneratorSettings::default()
        };
        settings.save_to_file(&path).unwrap();
        assert_eq!(GeneratorSettings::load_from_file(&path).unwrap(), settings);
    }

    #[test]
    fn test_validation_warnings() {
        let settings = GeneratorSettings {
            skip_metadata: true,
            skip_forms: true,
            ..GeneratorSettings::default()
        };
        assert_eq!(settings.validate().len(), 2);
    }
}
