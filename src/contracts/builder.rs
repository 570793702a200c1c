/*!
# Contract Builder

Сборка контрактов из разобранных объектов и форм. Построение не
меняет входных данных и не зависит от времени или порядка хеширования:
повторный запуск на тех же данных дает побайтно тот же JSON.
*/

use serde::Serialize;

use super::model::{
    CommandContract, ControlContract, FormContract, FormKind, ObjectContract, PropertyContract,
    TabularSectionContract,
};
use super::search::SearchMetadataEnricher;
use crate::configuration::objects::{ConfigurationObject, FormDescriptor};
use crate::core::{ContractError, DiagnosticCollector, DiagnosticKind};

/// Корень путей к данным формы объекта
pub const BINDING_ROOT: &str = "Объект";

#[derive(Debug, Clone, Default)]
pub struct ContractBuilder {
    enricher: SearchMetadataEnricher,
}

impl ContractBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build_object(
        &self,
        object: &ConfigurationObject,
        diagnostics: &mut DiagnosticCollector,
    ) -> ObjectContract {
        ObjectContract {
            object_type: object.kind.display_name().to_string(),
            name: object.name.clone(),
            comment: object.comment.clone(),
            properties: object.attributes.iter().map(PropertyContract::from).collect(),
            tabular_sections: object
                .tabular_sections
                .iter()
                .map(|section| TabularSectionContract {
                    name: section.name.clone(),
                    columns: section.columns.iter().map(PropertyContract::from).collect(),
                })
                .collect(),
            forms: object.forms.clone(),
            search_info: self.enricher.enrich(object, diagnostics),
        }
    }

    pub fn build_form(&self, object: &ConfigurationObject, form: &FormDescriptor) -> FormContract {
        FormContract {
            form_type: FormKind::classify(&form.name, &object.kind),
            object_name: object.qualified_name(),
            form_name: form.name.clone(),
            main_attribute: form.main_attribute.clone(),
            attributes: form.attributes.iter().map(PropertyContract::from).collect(),
            controls: form
                .controls
                .iter()
                .map(|control| ControlContract {
                    name: control.name.clone(),
                    role: control.role,
                    binding: binding_path(object, &control.name),
                })
                .collect(),
            commands: form
                .commands
                .iter()
                .map(|command| CommandContract {
                    name: command.name.clone(),
                    action: command.action.clone(),
                })
                .collect(),
        }
    }

    /// Контракты объявленных форм в порядке объявления.
    /// Объявленная форма без описания дает `UnresolvedReference`, лишние описания игнорируются.
    pub fn build_forms(
        &self,
        object: &ConfigurationObject,
        descriptors: &[FormDescriptor],
        diagnostics: &mut DiagnosticCollector,
    ) -> Vec<FormContract> {
        let mut contracts = Vec::new();
        for form_name in &object.forms {
            match descriptors.iter().find(|d| d.name == *form_name) {
                Some(descriptor) => contracts.push(self.build_form(object, descriptor)),
                None => {
                    let unresolved = ContractError::UnresolvedReference {
                        object: object.qualified_name(),
                        form: form_name.clone(),
                    };
                    diagnostics.warn(DiagnosticKind::UnresolvedReference, unresolved.to_string());
                }
            }
        }
        contracts
    }
}

/// Путь к данным для элемента формы: реквизит, затем табличная часть, затем колонка
pub fn binding_path(object: &ConfigurationObject, control_name: &str) -> Option<String> {
    if object.attribute(control_name).is_some() {
        return Some(format!("{}.{}", BINDING_ROOT, control_name));
    }
    if object.tabular_section(control_name).is_some() {
        return Some(format!("{}.{}", BINDING_ROOT, control_name));
    }
    object
        .tabular_sections
        .iter()
        .find(|section| section.column(control_name).is_some())
        .map(|section| format!("{}.{}.{}", BINDING_ROOT, section.name, control_name))
}

/// JSON представление контракта с завершающим переводом строки
pub fn to_json<T: Serialize>(record: &T, pretty: bool) -> serde_json::Result<String> {
    let mut json = if pretty {
        serde_json::to_string_pretty(record)?
    } else {
        serde_json::to_string(record)?
    };
    json.push('\n');
    Ok(json)
}
