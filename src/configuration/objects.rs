//! Объекты конфигурации: нормализованная модель, общая для отчета и XML выгрузки.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::type_normalizer::{TypeDescriptor, UNDEFINED_TYPE};

/// Сведения о виде объекта: как он называется в отчете, в XML и в контрактах
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindInfo {
    pub kind: KnownKind,
    /// Корневая коллекция в текстовом отчете (`Справочники`)
    pub report_root: &'static str,
    /// Тег класса в XML выгрузке (`Catalog`)
    pub xml_tag: &'static str,
    /// Отображаемое имя в контрактах (`Справочник`)
    pub display: &'static str,
    /// Папка выгрузки (`Catalogs`)
    pub xml_folder: &'static str,
}

/// Известные виды объектов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownKind {
    Catalog,
    Document,
    Constant,
    CommonForm,
    Report,
    DataProcessor,
    InformationRegister,
    AccumulationRegister,
    AccountingRegister,
    CalculationRegister,
    ChartOfCharacteristicTypes,
    ChartOfAccounts,
    ChartOfCalculationTypes,
    ExchangePlan,
    BusinessProcess,
    Task,
    Enum,
    DocumentJournal,
}

const fn info(
    kind: KnownKind,
    report_root: &'static str,
    xml_tag: &'static str,
    display: &'static str,
    xml_folder: &'static str,
) -> KindInfo {
    KindInfo { kind, report_root, xml_tag, display, xml_folder }
}

pub const KIND_TABLE: &[KindInfo] = &[
    info(KnownKind::Catalog, "Справочники", "Catalog", "Справочник", "Catalogs"),
    info(KnownKind::Document, "Документы", "Document", "Документ", "Documents"),
    info(KnownKind::Constant, "Константы", "Constant", "Константа", "Constants"),
    info(KnownKind::CommonForm, "ОбщиеФормы", "CommonForm", "ОбщаяФорма", "CommonForms"),
    info(KnownKind::Report, "Отчеты", "Report", "Отчет", "Reports"),
    info(KnownKind::DataProcessor, "Обработки", "DataProcessor", "Обработка", "DataProcessors"),
    info(
        KnownKind::InformationRegister,
        "РегистрыСведений",
        "InformationRegister",
        "РегистрСведений",
        "InformationRegisters",
    ),
    info(
        KnownKind::AccumulationRegister,
        "РегистрыНакопления",
        "AccumulationRegister",
        "РегистрНакопления",
        "AccumulationRegisters",
    ),
    info(
        KnownKind::AccountingRegister,
        "РегистрыБухгалтерии",
        "AccountingRegister",
        "РегистрБухгалтерии",
        "AccountingRegisters",
    ),
    info(
        KnownKind::CalculationRegister,
        "РегистрыРасчета",
        "CalculationRegister",
        "РегистрРасчета",
        "CalculationRegisters",
    ),
    info(
        KnownKind::ChartOfCharacteristicTypes,
        "ПланыВидовХарактеристик",
        "ChartOfCharacteristicTypes",
        "ПланВидовХарактеристик",
        "ChartsOfCharacteristicTypes",
    ),
    info(
        KnownKind::ChartOfAccounts,
        "ПланыСчетов",
        "ChartOfAccounts",
        "ПланСчетов",
        "ChartsOfAccounts",
    ),
    info(
        KnownKind::ChartOfCalculationTypes,
        "ПланыВидовРасчета",
        "ChartOfCalculationTypes",
        "ПланВидовРасчета",
        "ChartsOfCalculationTypes",
    ),
    info(KnownKind::ExchangePlan, "ПланыОбмена", "ExchangePlan", "ПланОбмена", "ExchangePlans"),
    info(
        KnownKind::BusinessProcess,
        "БизнесПроцессы",
        "BusinessProcess",
        "БизнесПроцесс",
        "BusinessProcesses",
    ),
    info(KnownKind::Task, "Задачи", "Task", "Задача", "Tasks"),
    info(KnownKind::Enum, "Перечисления", "Enum", "Перечисление", "Enums"),
    info(
        KnownKind::DocumentJournal,
        "ЖурналыДокументов",
        "DocumentJournal",
        "ЖурналДокументов",
        "DocumentJournals",
    ),
];

/// Вид объекта конфигурации; неизвестные виды сохраняются как есть
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Known(KnownKind),
    Other(String),
}

impl ObjectKind {
    /// Вид по корневой коллекции отчета (`Справочники`)
    pub fn from_report_root(root: &str) -> Option<Self> {
        KIND_TABLE
            .iter()
            .find(|i| i.report_root == root)
            .map(|i| ObjectKind::Known(i.kind))
    }

    /// Вид по тегу класса XML; незнакомый тег становится `Other`
    pub fn from_xml_tag(tag: &str) -> Self {
        KIND_TABLE
            .iter()
            .find(|i| i.xml_tag == tag)
            .map(|i| ObjectKind::Known(i.kind))
            .unwrap_or_else(|| ObjectKind::Other(tag.to_string()))
    }

    /// Вид по имени папки выгрузки (`Catalogs`)
    pub fn from_xml_folder(folder: &str) -> Option<Self> {
        KIND_TABLE
            .iter()
            .find(|i| i.xml_folder == folder)
            .map(|i| ObjectKind::Known(i.kind))
    }

    pub fn info(&self) -> Option<&'static KindInfo> {
        match self {
            ObjectKind::Known(kind) => KIND_TABLE.iter().find(|i| i.kind == *kind),
            ObjectKind::Other(_) => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ObjectKind::Known(_) => self.info().map(|i| i.display).unwrap_or(UNDEFINED_TYPE),
            ObjectKind::Other(tag) => tag,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Информация о реквизите
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    /// Тип в том виде, в каком он был в источнике
    pub raw_type: Option<String>,
    /// Нормализованный отображаемый тип, никогда не пустой
    pub normalized_type: String,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub comment: Option<String>,
}

impl Attribute {
    pub fn new(
        name: impl Into<String>,
        raw_type: Option<String>,
        descriptor: TypeDescriptor,
    ) -> Self {
        let normalized_type = if descriptor.normalized.trim().is_empty() {
            UNDEFINED_TYPE.to_string()
        } else {
            descriptor.normalized
        };
        Self {
            name: name.into(),
            raw_type,
            normalized_type,
            length: descriptor.length,
            precision: descriptor.precision,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }
}

/// Табличная часть
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularSection {
    pub name: String,
    pub columns: Vec<Attribute>,
}

impl TabularSection {
    pub fn column(&self, name: &str) -> Option<&Attribute> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Объект конфигурации после разбора
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationObject {
    pub kind: ObjectKind,
    pub name: String,
    pub comment: Option<String>,
    pub attributes: Vec<Attribute>,
    pub tabular_sections: Vec<TabularSection>,
    pub forms: Vec<String>,
}

impl ConfigurationObject {
    /// Полное имя объекта: `Справочник.Контрагенты`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.kind.display_name(), self.name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn tabular_section(&self, name: &str) -> Option<&TabularSection> {
        self.tabular_sections.iter().find(|t| t.name == name)
    }
}

/// Структурная роль элемента управления формы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlRole {
    Table,
    InputField,
    Button,
}

impl ControlRole {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Table" => Some(ControlRole::Table),
            "InputField" => Some(ControlRole::InputField),
            "Button" => Some(ControlRole::Button),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormControl {
    pub name: String,
    pub role: ControlRole,
}

/// Команда формы и ее обработчик
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormCommand {
    pub name: String,
    pub action: Option<String>,
}

/// Описание формы: реквизиты, элементы управления и команды в порядке документа
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDescriptor {
    pub name: String,
    /// Реквизиты формы (`Объект`, `Список`, собственные)
    pub attributes: Vec<Attribute>,
    /// Реквизит с `MainAttribute = true`
    pub main_attribute: Option<String>,
    pub controls: Vec<FormControl>,
    pub commands: Vec<FormCommand>,
}

impl FormDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            main_attribute: None,
            controls: Vec::new(),
            commands: Vec::new(),
        }
    }

    fn names_with_role(&self, role: ControlRole) -> Vec<&str> {
        self.controls
            .iter()
            .filter(|c| c.role == role)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn tables(&self) -> Vec<&str> {
        self.names_with_role(ControlRole::Table)
    }

    pub fn input_fields(&self) -> Vec<&str> {
        self.names_with_role(ControlRole::InputField)
    }

    pub fn buttons(&self) -> Vec<&str> {
        self.names_with_role(ControlRole::Button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_lookups_agree() {
        let by_report = ObjectKind::from_report_root("Справочники").unwrap();
        let by_tag = ObjectKind::from_xml_tag("Catalog");
        let by_folder = ObjectKind::from_xml_folder("Catalogs").unwrap();
        assert_eq!(by_report, by_tag);
        assert_eq!(by_tag, by_folder);
        assert_eq!(by_report.display_name(), "Справочник");
    }

    #[test]
    fn test_unknown_tag_is_other() {
        let kind = ObjectKind::from_xml_tag("Bot");
        assert_eq!(kind, ObjectKind::Other("Bot".to_string()));
        assert!(kind.info().is_none());
        assert_eq!(kind.display_name(), "Bot");
        assert!(ObjectKind::from_report_root("Боты").is_none());
    }

    #[test]
    fn test_kind_table_has_unique_keys() {
        for (i, a) in KIND_TABLE.iter().enumerate() {
            for b in &KIND_TABLE[i + 1..] {
                assert_ne!(a.report_root, b.report_root);
                assert_ne!(a.xml_tag, b.xml_tag);
                assert_ne!(a.xml_folder, b.xml_folder);
            }
        }
    }

    #[test]
    fn test_form_descriptor_views_keep_document_order() {
        let mut form = FormDescriptor::new("ФормаЭлемента");
        for (name, role) in [
            ("Товары", ControlRole::Table),
            ("Наименование", ControlRole::InputField),
            ("Записать", ControlRole::Button),
            ("Код", ControlRole::InputField),
        ] {
            form.controls.push(FormControl { name: name.to_string(), role });
        }
        assert_eq!(form.input_fields(), vec!["Наименование", "Код"]);
        assert_eq!(form.tables(), vec!["Товары"]);
        assert_eq!(form.buttons(), vec!["Записать"]);
    }

    #[test]
    fn test_empty_descriptor_falls_back_to_undefined() {
        let attr = Attribute::new("Х", None, TypeDescriptor::default());
        assert_eq!(attr.normalized_type, UNDEFINED_TYPE);
    }
}
