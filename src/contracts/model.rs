//! Записи контрактов в том виде, в каком они сериализуются в JSON.
//!
//! Порядок полей в структурах задает порядок ключей в выходных файлах,
//! поэтому здесь нет `HashMap`: одинаковый вход дает побайтно одинаковый JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::configuration::objects::{Attribute, ControlRole, ObjectKind};

/// Реквизит или колонка табличной части
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyContract {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl From<&Attribute> for PropertyContract {
    fn from(attribute: &Attribute) -> Self {
        Self {
            name: attribute.name.clone(),
            type_name: attribute.normalized_type.clone(),
            length: attribute.length,
            precision: attribute.precision,
            comment: attribute.comment.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularSectionContract {
    pub name: String,
    pub columns: Vec<PropertyContract>,
}

/// Поисковые метаданные объекта
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInfo {
    /// Папка-категория (`Catalogs`), `uncategorized` для неизвестных видов
    pub category: String,
    /// `{Category}_{Name}`
    pub full_name: String,
    pub keywords: Vec<String>,
    /// Номера задач из комментария
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<String>,
}

/// Контракт объекта конфигурации
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectContract {
    #[serde(rename = "type")]
    pub object_type: String,
    pub name: String,
    pub comment: Option<String>,
    pub properties: Vec<PropertyContract>,
    pub tabular_sections: Vec<TabularSectionContract>,
    pub forms: Vec<String>,
    pub search_info: SearchInfo,
}

/// Вид формы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    List,
    Choice,
    Item,
    Object,
    Settings,
    Report,
    DataProcessor,
    Common,
}

impl FormKind {
    /// Вид формы по имени и виду владельца
    pub fn classify(form_name: &str, owner: &ObjectKind) -> Self {
        use crate::configuration::objects::KnownKind;

        if *owner == ObjectKind::Known(KnownKind::CommonForm) {
            return FormKind::Common;
        }

        let name_lower = form_name.to_lowercase();
        if name_lower.contains("список") || name_lower.contains("list") {
            FormKind::List
        } else if name_lower.contains("выбор") || name_lower.contains("choice") {
            FormKind::Choice
        } else if name_lower.contains("элемент") || name_lower.contains("item") {
            FormKind::Item
        } else if name_lower.contains("настройк") || name_lower.contains("settings") {
            FormKind::Settings
        } else if name_lower.contains("отчет") || name_lower.contains("report") {
            FormKind::Report
        } else if name_lower.contains("обработк") || name_lower.contains("dataprocessor") {
            FormKind::DataProcessor
        } else {
            match owner {
                ObjectKind::Known(KnownKind::Report) => FormKind::Report,
                ObjectKind::Known(KnownKind::DataProcessor) => FormKind::DataProcessor,
                _ => FormKind::Object,
            }
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormKind::List => "ФормаСписка",
            FormKind::Choice => "ФормаВыбора",
            FormKind::Item => "ФормаЭлемента",
            FormKind::Object => "ФормаОбъекта",
            FormKind::Settings => "ФормаНастроек",
            FormKind::Report => "ФормаОтчета",
            FormKind::DataProcessor => "ФормаОбработки",
            FormKind::Common => "ОбщаяФорма",
        };
        write!(f, "{}", name)
    }
}

/// Элемент управления в контракте формы
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlContract {
    pub name: String,
    pub role: ControlRole,
    /// Путь к данным (`Объект.Наименование`), если имя совпало с реквизитом
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
}

/// Команда формы
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContract {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Контракт формы
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormContract {
    pub form_type: FormKind,
    /// Владелец: `Справочник.Контрагенты`
    pub object_name: String,
    pub form_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_attribute: Option<String>,
    #[serde(default)]
    pub attributes: Vec<PropertyContract>,
    pub controls: Vec<ControlContract>,
    #[serde(default)]
    pub commands: Vec<CommandContract>,
}

impl FormContract {
    /// Имя файла контракта: `Справочник.Контрагенты.ФормаЭлемента`
    pub fn file_stem(&self) -> String {
        format!("{}.{}", self.object_name, self.form_name)
    }
}
