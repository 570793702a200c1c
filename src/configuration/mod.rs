/*!
# Configuration Sources

Разбор исходных артефактов конфигурации: текстового отчета и XML выгрузки.
`ConfigurationDump` находит файлы объектов и форм в каталоге выгрузки,
парсеры превращают их в `ConfigurationObject` и `FormDescriptor`.
*/

pub mod arena;
pub mod form_parser;
pub mod metadata_parser;
pub mod objects;
pub mod report_parser;
pub mod type_normalizer;
pub mod xml_tree;

pub use arena::{MetadataNode, MetadataNodeKind, MetadataTree, NodeId};
pub use form_parser::{FormParseResult, XmlFormParser};
pub use metadata_parser::{XmlObjectParseResult, XmlObjectParser};
pub use objects::{
    Attribute, ConfigurationObject, ControlRole, FormCommand, FormControl, FormDescriptor,
    KnownKind, ObjectKind, TabularSection,
};
pub use report_parser::{ReportParseResult, ReportTree, ReportTreeParser};
pub use type_normalizer::{
    TypeDescriptor, TypeNormalizer, TypeRule, BUILTIN_TYPE_RULES, UNDEFINED_TYPE,
};
pub use xml_tree::{XmlDocument, XmlNamespaces};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use objects::KIND_TABLE;

/// Файл формы объекта
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSource {
    pub name: String,
    pub path: PathBuf,
}

/// XML описание объекта и найденные рядом файлы форм
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSource {
    pub kind: ObjectKind,
    /// Имя папки выгрузки (`Catalogs`)
    pub folder: String,
    pub name: String,
    pub xml_path: PathBuf,
    pub forms: Vec<FormSource>,
}

impl ObjectSource {
    pub fn form(&self, name: &str) -> Option<&FormSource> {
        self.forms.iter().find(|f| f.name == name)
    }
}

/// Выгрузка конфигурации в файлы
#[derive(Debug, Clone)]
pub struct ConfigurationDump {
    pub path: PathBuf,
    pub objects: Vec<ObjectSource>,
}

impl ConfigurationDump {
    /// Обходит известные папки выгрузки в детерминированном порядке
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_dir() {
            anyhow::bail!("Configuration directory not found: {}", path.display());
        }
        tracing::info!("Scanning configuration dump: {}", path.display());

        let mut objects = Vec::new();
        for info in KIND_TABLE {
            let folder = path.join(info.xml_folder);
            if !folder.is_dir() {
                continue;
            }
            let kind = ObjectKind::Known(info.kind);
            let found = Self::discover_folder(&folder, kind, info.xml_folder)
                .with_context(|| format!("Failed to scan {}", folder.display()))?;
            tracing::debug!("{}: {} objects", info.xml_folder, found.len());
            objects.extend(found);
        }

        tracing::info!("Found {} objects in configuration dump", objects.len());
        Ok(Self { path, objects })
    }

    fn discover_folder(
        folder: &Path,
        kind: ObjectKind,
        folder_name: &str,
    ) -> Result<Vec<ObjectSource>> {
        let mut sources: Vec<ObjectSource> = Vec::new();

        for entry in WalkDir::new(folder)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = entry?;
            let file = entry.path();
            let is_xml = file.extension().and_then(|e| e.to_str()) == Some("xml");
            if !entry.file_type().is_file() || !is_xml {
                continue;
            }
            let Some(stem) = file.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            // `<Folder>/<Name>.xml` или старый вариант `<Folder>/<Name>/<Name>.xml`
            let is_object_file = match entry.depth() {
                1 => true,
                _ => file
                    .parent()
                    .and_then(|p| p.file_name())
                    .map(|dir| dir.to_string_lossy() == stem)
                    .unwrap_or(false),
            };
            if !is_object_file || sources.iter().any(|s| s.name == stem) {
                continue;
            }

            let forms = Self::discover_forms(&folder.join(&stem), &kind, &stem)?;
            sources.push(ObjectSource {
                kind: kind.clone(),
                folder: folder_name.to_string(),
                name: stem,
                xml_path: file.to_path_buf(),
                forms,
            });
        }

        Ok(sources)
    }

    fn discover_forms(
        object_dir: &Path,
        kind: &ObjectKind,
        object_name: &str,
    ) -> Result<Vec<FormSource>> {
        let mut forms = Vec::new();

        // Общая форма сама является формой: `CommonForms/<Name>/Ext/Form.xml`
        if *kind == ObjectKind::Known(KnownKind::CommonForm) {
            if let Some(path) = Self::form_file(object_dir) {
                forms.push(FormSource {
                    name: object_name.to_string(),
                    path,
                });
            }
            return Ok(forms);
        }

        let forms_dir = object_dir.join("Forms");
        if !forms_dir.is_dir() {
            return Ok(forms);
        }
        for entry in WalkDir::new(&forms_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(path) = Self::form_file(entry.path()) {
                forms.push(FormSource {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    path,
                });
            }
        }
        Ok(forms)
    }

    fn form_file(form_dir: &Path) -> Option<PathBuf> {
        [form_dir.join("Ext").join("Form.xml"), form_dir.join("Form.xml")]
            .into_iter()
            .find(|p| p.is_file())
    }
}
