/*!
# Metadata XML Parser

Парсер XML описаний объектов из выгрузки конфигурации в файлы
(`Catalogs/Контрагенты.xml`, `Documents/Заказ.xml` и т.д.).

Реквизиты, табличные части и формы выбираются только из прямого
`ChildObjects` элемента объекта. Реквизиты табличных частей лежат
глубже, в `TabularSection/ChildObjects`, и на верхний уровень не попадают.

## Использование

```rust,ignore
let parser = XmlObjectParser::new(XmlNamespaces::default());
let parsed = parser.parse_file(Path::new("conf/Catalogs/Контрагенты.xml"))?;
println!("{}", parsed.object.qualified_name());
```
*/

use std::path::Path;

use super::arena::{MetadataTree, NodeId};
use super::objects::{Attribute, ConfigurationObject, KnownKind, ObjectKind};
use super::type_normalizer::{TypeDescriptor, TypeNormalizer};
use super::xml_tree::{ElementId, XmlDocument, XmlNamespaces};
use crate::core::{
    read_text_file, ContractError, ContractResult, DiagnosticCollector, DiagnosticKind,
};

/// Элементы `ChildObjects`, которые становятся реквизитами
const ATTRIBUTE_TAGS: &[&str] = &["Attribute", "Dimension", "Resource"];

/// Атрибуты, в которых встречается тип в сокращенной записи
const TYPE_ATTRIBUTE_NAMES: &[&str] = &["value", "text", "type"];

/// Имя реквизита, под которым выводится значение константы
pub const CONSTANT_VALUE_ATTRIBUTE: &str = "Значение";

/// Результат разбора одного файла объекта
#[derive(Debug, Clone)]
pub struct XmlObjectParseResult {
    pub object: ConfigurationObject,
    pub diagnostics: DiagnosticCollector,
}

/// Парсер XML описаний объектов
#[derive(Debug, Clone, Default)]
pub struct XmlObjectParser {
    namespaces: XmlNamespaces,
    normalizer: TypeNormalizer,
}

impl XmlObjectParser {
    pub fn new(namespaces: XmlNamespaces) -> Self {
        Self {
            namespaces,
            normalizer: TypeNormalizer::new(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: TypeNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn namespaces(&self) -> &XmlNamespaces {
        &self.namespaces
    }

    pub fn parse_file(&self, path: &Path) -> ContractResult<XmlObjectParseResult> {
        let decoded = read_text_file(path)?;
        self.parse_str(&decoded.text, path)
    }

    pub fn parse_str(&self, text: &str, path: &Path) -> ContractResult<XmlObjectParseResult> {
        let document = XmlDocument::parse(text, path)?;
        let mut result = self.parse_document(&document, path)?;
        result.diagnostics.attach_path(path);
        Ok(result)
    }

    pub fn parse_document(
        &self,
        doc: &XmlDocument,
        path: &Path,
    ) -> ContractResult<XmlObjectParseResult> {
        let md = self.namespaces.metadata.as_str();
        let object_el = self.object_element(doc, path)?;
        let kind = ObjectKind::from_xml_tag(&doc.element(object_el).local_name);
        let properties = doc.child(object_el, md, "Properties");

        let name = properties
            .and_then(|p| doc.child(p, md, "Name"))
            .and_then(|n| doc.text(n))
            .or_else(|| doc.element(object_el).attribute("name").filter(|n| !n.trim().is_empty()))
            .map(|n| n.trim().to_string())
            .or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .filter(|s| !s.is_empty())
            })
            .ok_or_else(|| ContractError::missing(path, "object name"))?;

        tracing::debug!("Parsing {} {} from {}", kind, name, path.display());

        let mut tree = MetadataTree::new();
        let mut diagnostics = DiagnosticCollector::new();
        let object = tree.add_object(kind.clone(), name.as_str());

        if let Some(props) = properties {
            let comment = doc
                .child(props, md, "Comment")
                .and_then(|c| doc.text(c))
                .map(str::to_string);
            tree.set_comment(object, comment);

            if kind == ObjectKind::Known(KnownKind::Constant) {
                if doc.child(props, md, "Type").is_some() {
                    let attribute =
                        self.attribute_from_properties(doc, props, CONSTANT_VALUE_ATTRIBUTE);
                    tree.add_attribute(object, attribute);
                }
            }
        }

        if let Some(child_objects) = doc.child(object_el, md, "ChildObjects") {
            self.collect_child_objects(doc, child_objects, &mut tree, object, &mut diagnostics);
        }

        diagnostics.merge(tree.take_diagnostics());
        let object = tree
            .object(object)
            .ok_or_else(|| ContractError::missing(path, "object node"))?;
        Ok(XmlObjectParseResult { object, diagnostics })
    }

    // `<MetaDataObject><Catalog>...` или сразу `<Catalog>...`
    fn object_element(&self, doc: &XmlDocument, path: &Path) -> ContractResult<ElementId> {
        let root = doc.root();
        if doc.element(root).is(&self.namespaces.metadata, "MetaDataObject") {
            doc.children(root)
                .next()
                .ok_or_else(|| ContractError::missing(path, "object element inside MetaDataObject"))
        } else {
            Ok(root)
        }
    }

    fn collect_child_objects(
        &self,
        doc: &XmlDocument,
        child_objects: ElementId,
        tree: &mut MetadataTree,
        object: NodeId,
        diagnostics: &mut DiagnosticCollector,
    ) {
        let md = self.namespaces.metadata.as_str();
        for child in doc.children(child_objects) {
            let element = doc.element(child);
            if ATTRIBUTE_TAGS.iter().any(|tag| element.is(md, tag)) {
                match self.parse_attribute(doc, child) {
                    Some(attribute) => {
                        tree.add_attribute(object, attribute);
                    }
                    None => diagnostics.warn(
                        DiagnosticKind::MissingData,
                        format!("<{}> without a name is skipped", element.local_name),
                    ),
                }
            } else if element.is(md, "TabularSection") {
                let Some(section_name) = self.element_name(doc, child) else {
                    diagnostics.warn(
                        DiagnosticKind::MissingData,
                        "Tabular section without a name is skipped",
                    );
                    continue;
                };
                let section = tree.add_tabular_section(object, &section_name);
                let columns = doc.child(child, md, "ChildObjects");
                let columns = columns
                    .into_iter()
                    .flat_map(|c| doc.children_named(c, md, "Attribute"));
                for column in columns {
                    match self.parse_attribute(doc, column) {
                        Some(attribute) => {
                            tree.add_attribute(section, attribute);
                        }
                        None => diagnostics.warn(
                            DiagnosticKind::MissingData,
                            format!("Column without a name in {} is skipped", section_name),
                        ),
                    }
                }
            } else if element.is(md, "Form") {
                let form_name = doc
                    .path(child, md, &["Properties", "Name"])
                    .and_then(|n| doc.text(n))
                    .or_else(|| doc.text(child));
                match form_name {
                    Some(form_name) => {
                        tree.add_form(object, form_name);
                    }
                    None => diagnostics.warn(
                        DiagnosticKind::MissingData,
                        "Form reference without a name",
                    ),
                }
            }
        }
    }

    fn element_name(&self, doc: &XmlDocument, element: ElementId) -> Option<String> {
        doc.path(element, &self.namespaces.metadata, &["Properties", "Name"])
            .and_then(|n| doc.text(n))
            .or_else(|| doc.element(element).attribute("name"))
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
    }

    fn parse_attribute(&self, doc: &XmlDocument, element: ElementId) -> Option<Attribute> {
        let name = self.element_name(doc, element)?;
        let attribute = doc
            .child(element, &self.namespaces.metadata, "Properties")
            .map(|props| self.attribute_from_properties(doc, props, &name))
            .unwrap_or_else(|| Attribute::new(name.as_str(), None, TypeDescriptor::undefined()));
        Some(attribute)
    }

    fn attribute_from_properties(
        &self,
        doc: &XmlDocument,
        props: ElementId,
        name: &str,
    ) -> Attribute {
        let md = self.namespaces.metadata.as_str();
        let comment = doc
            .child(props, md, "Comment")
            .and_then(|c| doc.text(c))
            .map(str::to_string);
        self.typed_attribute(doc, name, doc.child(props, md, "Type"))
            .with_comment(comment)
    }

    /// Реквизит с типом из элемента `Type` (объекта или формы); без него тип `Undefined`
    pub fn typed_attribute(
        &self,
        doc: &XmlDocument,
        name: &str,
        type_property: Option<ElementId>,
    ) -> Attribute {
        let Some(type_property) = type_property else {
            return Attribute::new(name, None, TypeDescriptor::undefined());
        };
        let raw = self.extract_type_token(doc, type_property);
        let mut descriptor = self.normalizer.describe_opt(raw.as_deref());

        let (length, precision) = self.extract_qualifiers(doc, type_property);
        if length.is_some() {
            descriptor.length = length;
            descriptor.precision = precision;
        }
        Attribute::new(name, raw, descriptor)
    }

    /// Тип реквизита: первая непустая из трех стратегий
    pub fn extract_type_token(
        &self,
        doc: &XmlDocument,
        type_property: ElementId,
    ) -> Option<String> {
        let core = self.namespaces.core.as_str();
        let core_types: Vec<ElementId> = doc
            .children(type_property)
            .filter(|id| {
                let el = doc.element(*id);
                el.is(core, "Type") || el.is(core, "TypeSet")
            })
            .collect();

        // (a) текст `v8:Type`; составной тип дает несколько элементов
        let texts: Vec<&str> = core_types.iter().filter_map(|id| doc.text(*id)).collect();
        if !texts.is_empty() {
            return Some(texts.join(", "));
        }

        // (b) сокращенная запись в атрибутах
        let candidates = core_types
            .first()
            .copied()
            .into_iter()
            .chain(std::iter::once(type_property));
        for candidate in candidates {
            let element = doc.element(candidate);
            if let Some(value) = TYPE_ATTRIBUTE_NAMES
                .iter()
                .filter_map(|attr| element.attribute(attr))
                .map(str::trim)
                .find(|v| !v.is_empty())
            {
                return Some(value.to_string());
            }
        }

        // (c) собственный текст свойства
        doc.text(type_property).map(str::to_string)
    }

    fn extract_qualifiers(
        &self,
        doc: &XmlDocument,
        type_property: ElementId,
    ) -> (Option<u32>, Option<u32>) {
        let core = self.namespaces.core.as_str();
        let number = |steps: &[&str]| {
            doc.path(type_property, core, steps)
                .and_then(|id| doc.text(id))
                .and_then(|t| t.parse::<u32>().ok())
        };

        if let Some(length) = number(&["StringQualifiers", "Length"]).filter(|l| *l > 0) {
            return (Some(length), None);
        }
        match number(&["NumberQualifiers", "Digits"]).filter(|d| *d > 0) {
            Some(digits) => (
                Some(digits),
                number(&["NumberQualifiers", "FractionDigits"]).filter(|p| *p > 0),
            ),
            None => (None, None),
        }
    }
}
