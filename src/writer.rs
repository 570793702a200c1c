//! Запись контрактов: трейт приемника и файловая реализация.
//!
//! Раскладка файлов:
//! - `<out>/<Category>/<Name>.json` для объектов;
//! - `<out>/Forms/<Owner>.<Form>.json` для форм.
//!
//! Имена из выгрузки становятся одним компонентом пути: разделители и
//! запрещенные символы заменяются на `_`, поэтому запись не выходит за `<out>`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::contracts::{to_json, FormContract, ObjectContract};

/// Каталог контрактов форм внутри каталога результата
pub const FORMS_DIR: &str = "Forms";

/// Получатель готовых контрактов
pub trait ContractSink {
    /// Вызывается один раз до первой записи
    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_object(&mut self, contract: &ObjectContract) -> Result<PathBuf>;

    fn write_form(&mut self, contract: &FormContract) -> Result<PathBuf>;
}

/// Пишет контракты в дерево каталогов
#[derive(Debug, Clone)]
pub struct FsContractSink {
    output_dir: PathBuf,
    pretty: bool,
    clean: bool,
}

impl FsContractSink {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            pretty: true,
            clean: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn object_path(&self, contract: &ObjectContract) -> PathBuf {
        self.output_dir.join(object_file(contract))
    }

    pub fn form_path(&self, contract: &FormContract) -> PathBuf {
        self.output_dir.join(form_file(contract))
    }

    fn write(&self, path: &Path, json: String) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, json)
            .with_context(|| format!("Failed to write contract {}", path.display()))?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Удаляет старые `*.json`, остальные файлы не трогает
    fn clean_output(&self) -> Result<usize> {
        let mut removed = 0usize;
        for entry in WalkDir::new(&self.output_dir).min_depth(1) {
            let entry = entry?;
            let path = entry.path();
            let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
            if entry.file_type().is_file() && is_json {
                fs::remove_file(path)
                    .with_context(|| format!("Failed to remove old contract {}", path.display()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl ContractSink for FsContractSink {
    fn prepare(&mut self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;
        if self.clean {
            let removed = self.clean_output()?;
            tracing::info!("Removed {} old contracts from {}", removed, self.output_dir.display());
        }
        Ok(())
    }

    fn write_object(&mut self, contract: &ObjectContract) -> Result<PathBuf> {
        let json = to_json(contract, self.pretty).context("Failed to serialize object contract")?;
        self.write(&self.object_path(contract), json)
    }

    fn write_form(&mut self, contract: &FormContract) -> Result<PathBuf> {
        let json = to_json(contract, self.pretty).context("Failed to serialize form contract")?;
        self.write(&self.form_path(contract), json)
    }
}

/// Собирает контракты в памяти
#[derive(Debug, Clone, Default)]
pub struct MemoryContractSink {
    pub objects: Vec<ObjectContract>,
    pub forms: Vec<FormContract>,
}

impl ContractSink for MemoryContractSink {
    fn write_object(&mut self, contract: &ObjectContract) -> Result<PathBuf> {
        self.objects.push(contract.clone());
        Ok(object_file(contract))
    }

    fn write_form(&mut self, contract: &FormContract) -> Result<PathBuf> {
        self.forms.push(contract.clone());
        Ok(form_file(contract))
    }
}

/// Путь контракта объекта относительно каталога результата
pub fn object_file(contract: &ObjectContract) -> PathBuf {
    PathBuf::from(file_component(&contract.search_info.category))
        .join(format!("{}.json", file_component(&contract.name)))
}

/// Путь контракта формы относительно каталога результата
pub fn form_file(contract: &FormContract) -> PathBuf {
    PathBuf::from(FORMS_DIR).join(format!("{}.json", file_component(&contract.file_stem())))
}

/// Имя из выгрузки -> безопасный компонент пути
pub fn file_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        tracing::warn!("Name {:?} cannot be used as a file name, replaced with '_'", name);
        return "_".to_string();
    }
    if cleaned != name {
        tracing::warn!("Name {:?} sanitized to {:?} for the output file", name, cleaned);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ControlRole;
    use crate::contracts::{ControlContract, FormKind, SearchInfo};
    use tempfile::TempDir;

    fn object_contract() -> ObjectContract {
        ObjectContract {
            object_type: "Справочник".to_string(),
            name: "Банки".to_string(),
            comment: None,
            properties: Vec::new(),
            tabular_sections: Vec::new(),
            forms: vec!["ФормаЭлемента".to_string()],
            search_info: SearchInfo {
                category: "Catalogs".to_string(),
                full_name: "Catalogs_Банки".to_string(),
                keywords: vec!["Справочник".to_string(), "Банки".to_string()],
                tasks: Vec::new(),
            },
        }
    }

    #[test]
    fn test_output_layout() {
        let temp = TempDir::new().unwrap();
        let mut sink = FsContractSink::new(temp.path());
        sink.prepare().unwrap();

        let object_path = sink.write_object(&object_contract()).unwrap();
        assert_eq!(object_path, temp.path().join("Catalogs").join("Банки.json"));

        let form = FormContract {
            form_type: FormKind::Item,
            object_name: "Справочник.Банки".to_string(),
            form_name: "ФормаЭлемента".to_string(),
            main_attribute: None,
            attributes: Vec::new(),
            controls: vec![ControlContract {
                name: "Код".to_string(),
                role: ControlRole::InputField,
                binding: None,
            }],
            commands: Vec::new(),
        };
        let form_path = sink.write_form(&form).unwrap();
        let expected = temp.path().join("Forms").join("Справочник.Банки.ФормаЭлемента.json");
        assert_eq!(form_path, expected);

        let text = fs::read_to_string(form_path).unwrap();
        assert!(text.contains("\"role\": \"input_field\""));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_file_component_blocks_path_escapes() {
        assert_eq!(file_component("Банки"), "Банки");
        assert_eq!(file_component("Справочник.Банки.Форма"), "Справочник.Банки.Форма");
        assert_eq!(file_component("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(file_component("a\\b:c"), "a_b_c");
        assert_eq!(file_component(".."), "_");
        assert_eq!(file_component("  "), "_");
    }

    #[test]
    fn test_hostile_names_stay_inside_output_dir() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let mut sink = FsContractSink::new(&out);
        sink.prepare().unwrap();

        let mut object = object_contract();
        object.name = "../../Побег".to_string();
        let path = sink.write_object(&object).unwrap();
        assert_eq!(path, out.join("Catalogs").join(".._.._Побег.json"));
        assert!(path.is_file());
        assert!(!temp.path().join("Побег.json").exists());

        let form = FormContract {
            form_type: FormKind::Object,
            object_name: "Справочник.Банки".to_string(),
            form_name: "../Форма".to_string(),
            main_attribute: None,
            attributes: Vec::new(),
            controls: Vec::new(),
            commands: Vec::new(),
        };
        let path = sink.write_form(&form).unwrap();
        assert_eq!(path.parent(), Some(out.join(FORMS_DIR).as_path()));
    }

    #[test]
    fn test_clean_removes_only_json() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Catalogs")).unwrap();
        fs::write(temp.path().join("Catalogs/Старый.json"), "{}").unwrap();
        fs::write(temp.path().join("README.md"), "keep").unwrap();

        FsContractSink::new(temp.path()).prepare().unwrap();
        assert!(!temp.path().join("Catalogs/Старый.json").exists());
        assert!(temp.path().join("README.md").exists());

        fs::write(temp.path().join("Catalogs/Старый.json"), "{}").unwrap();
        FsContractSink::new(temp.path()).with_clean(false).prepare().unwrap();
        assert!(temp.path().join("Catalogs/Старый.json").exists());
    }
}
