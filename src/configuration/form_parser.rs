/*!
# Form XML Parser

Парсер XML файлов управляемых форм 1С.

Собирает из документа (пространство имен logform или без привязки):
- реквизиты формы из `Attributes` с типами, прочитанными так же,
  как типы реквизитов объекта;
- элементы управления `Table`, `InputField` и `Button` в порядке документа;
- команды формы из `Commands` вместе с обработчиком `Action`.

Имя формы в самом `Form.xml` не хранится, его передает вызывающий
код по пути файла: `ConfigDir/ObjectType/ObjectName/Forms/FormName/Ext/Form.xml`.
*/

use std::path::Path;

use super::metadata_parser::XmlObjectParser;
use super::objects::{ControlRole, FormCommand, FormControl, FormDescriptor};
use super::type_normalizer::TypeNormalizer;
use super::xml_tree::{ElementId, XmlDocument, XmlNamespaces};
use crate::core::{read_text_file, ContractResult, DiagnosticCollector, DiagnosticKind};

/// Результат разбора одной формы
#[derive(Debug, Clone)]
pub struct FormParseResult {
    pub form: FormDescriptor,
    pub diagnostics: DiagnosticCollector,
}

/// Парсер XML форм
#[derive(Debug, Clone, Default)]
pub struct XmlFormParser {
    namespaces: XmlNamespaces,
    types: XmlObjectParser,
}

impl XmlFormParser {
    pub fn new(namespaces: XmlNamespaces) -> Self {
        Self {
            types: XmlObjectParser::new(namespaces.clone()),
            namespaces,
        }
    }

    pub fn with_normalizer(mut self, normalizer: TypeNormalizer) -> Self {
        self.types = self.types.with_normalizer(normalizer);
        self
    }

    pub fn parse_file(&self, path: &Path, form_name: &str) -> ContractResult<FormParseResult> {
        let decoded = read_text_file(path)?;
        self.parse_str(&decoded.text, form_name, path)
    }

    pub fn parse_str(
        &self,
        text: &str,
        form_name: &str,
        path: &Path,
    ) -> ContractResult<FormParseResult> {
        let document = XmlDocument::parse(text, path)?;
        let mut result = self.parse_document(&document, form_name);
        result.diagnostics.attach_path(path);
        tracing::debug!(
            "Form {} from {}: {} attributes, {} controls, {} commands",
            form_name,
            path.display(),
            result.form.attributes.len(),
            result.form.controls.len(),
            result.form.commands.len()
        );
        Ok(result)
    }

    pub fn parse_document(&self, doc: &XmlDocument, form_name: &str) -> FormParseResult {
        let ns = self.namespaces.form.as_str();
        let mut form = FormDescriptor::new(form_name);
        let mut diagnostics = DiagnosticCollector::new();

        for id in doc.descendants(doc.root()) {
            let element = doc.element(id);
            if !element.is(ns, &element.local_name) {
                continue;
            }

            if element.local_name == "Attribute" && self.parent_is(doc, id, "Attributes") {
                let Some(name) = element_name(doc, id) else {
                    diagnostics.warn(
                        DiagnosticKind::MissingData,
                        format!("Nameless form attribute in {} is skipped", form_name),
                    );
                    continue;
                };
                let is_main = doc
                    .child(id, ns, "MainAttribute")
                    .and_then(|m| doc.text(m))
                    .map_or(false, |v| v.eq_ignore_ascii_case("true"));
                if is_main && form.main_attribute.is_none() {
                    form.main_attribute = Some(name.to_string());
                }
                let attribute = self.types.typed_attribute(doc, name, doc.child(id, ns, "Type"));
                form.attributes.push(attribute);
                continue;
            }

            if element.local_name == "Command" && self.parent_is(doc, id, "Commands") {
                match element_name(doc, id) {
                    Some(name) => form.commands.push(FormCommand {
                        name: name.to_string(),
                        action: doc
                            .child(id, ns, "Action")
                            .and_then(|a| doc.text(a))
                            .map(str::to_string),
                    }),
                    None => diagnostics.warn(
                        DiagnosticKind::MissingData,
                        format!("Nameless form command in {} is skipped", form_name),
                    ),
                }
                continue;
            }

            let Some(role) = ControlRole::from_tag(&element.local_name) else {
                continue;
            };
            match element_name(doc, id) {
                Some(name) => form.controls.push(FormControl {
                    name: name.to_string(),
                    role,
                }),
                None => diagnostics.warn(
                    DiagnosticKind::MissingData,
                    format!("Nameless <{}> in form {} is skipped", element.local_name, form_name),
                ),
            }
        }

        FormParseResult { form, diagnostics }
    }

    fn parent_is(&self, doc: &XmlDocument, id: ElementId, local_name: &str) -> bool {
        doc.element(id)
            .parent
            .map_or(false, |p| doc.element(p).is(&self.namespaces.form, local_name))
    }
}

fn element_name(doc: &XmlDocument, id: ElementId) -> Option<&str> {
    doc.element(id)
        .attribute("name")
        .map(str::trim)
        .filter(|n| !n.is_empty())
}
