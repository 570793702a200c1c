//! Арена метаданных: объекты, реквизиты, табличные части и формы
//!
//! Все парсеры (текстовый отчет и XML выгрузка) складывают результат сюда.
//! Узлы ссылаются друг на друга через `NodeId`, без разделяемых указателей.
//! Готовые `ConfigurationObject` читаются из арены в конце разбора.

use super::objects::{Attribute, ConfigurationObject, ObjectKind, TabularSection};
use crate::core::{DiagnosticCollector, DiagnosticKind};

/// Устойчивый идентификатор узла внутри одной арены.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Вариант узла
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataNodeKind {
    Object { kind: ObjectKind, comment: Option<String> },
    Attribute(Attribute),
    TabularSection,
    Form,
}

#[derive(Debug, Clone)]
pub struct MetadataNode {
    pub name: String,
    pub kind: MetadataNodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Дерево метаданных одного источника
#[derive(Debug, Default, Clone)]
pub struct MetadataTree {
    nodes: Vec<MetadataNode>,
    roots: Vec<NodeId>,
    diagnostics: DiagnosticCollector,
}

impl MetadataTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, node: MetadataNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        if let Some(parent) = node.parent {
            self.nodes[parent.0 as usize].children.push(id);
        } else {
            self.roots.push(id);
        }
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &MetadataNode {
        &self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticCollector {
        std::mem::take(&mut self.diagnostics)
    }

    fn find_child(
        &self,
        scope: NodeId,
        name: &str,
        pred: fn(&MetadataNodeKind) -> bool,
    ) -> Option<NodeId> {
        self.node(scope)
            .children
            .iter()
            .copied()
            .find(|id| {
                let node = self.node(*id);
                node.name == name && pred(&node.kind)
            })
    }

    /// Добавляет объект; повтор того же вида и имени возвращает существующий узел
    pub fn add_object(&mut self, kind: ObjectKind, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let existing = self.roots.iter().copied().find(|id| {
            let node = self.node(*id);
            node.name == name
                && matches!(&node.kind, MetadataNodeKind::Object { kind: k, .. } if *k == kind)
        });
        if let Some(id) = existing {
            self.diagnostics.warn(
                DiagnosticKind::DuplicateName,
                format!("Object {}.{} is declared more than once", kind, name),
            );
            return id;
        }
        tracing::debug!("Object node {}.{}", kind, name);
        self.alloc(MetadataNode {
            name,
            kind: MetadataNodeKind::Object { kind, comment: None },
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn set_comment(&mut self, object: NodeId, comment: Option<String>) {
        if let MetadataNodeKind::Object { comment: slot, .. } =
            &mut self.nodes[object.0 as usize].kind
        {
            *slot = comment;
        }
    }

    /// Реквизит в области объекта или табличной части.
    /// Повтор имени в той же области отклоняется с предупреждением.
    pub fn add_attribute(&mut self, scope: NodeId, attribute: Attribute) -> Option<NodeId> {
        let scope_is_valid = matches!(
            self.node(scope).kind,
            MetadataNodeKind::Object { .. } | MetadataNodeKind::TabularSection
        );
        if !scope_is_valid {
            self.diagnostics.warn(
                DiagnosticKind::MissingData,
                format!("Attribute {} has no object or tabular section scope", attribute.name),
            );
            return None;
        }
        if self
            .find_child(scope, &attribute.name, |k| matches!(k, MetadataNodeKind::Attribute(_)))
            .is_some()
        {
            let message = format!(
                "Attribute {} is already declared in {}",
                attribute.name,
                self.node(scope).name
            );
            self.diagnostics.warn(DiagnosticKind::DuplicateName, message);
            return None;
        }
        Some(self.alloc(MetadataNode {
            name: attribute.name.clone(),
            kind: MetadataNodeKind::Attribute(attribute),
            parent: Some(scope),
            children: Vec::new(),
        }))
    }

    pub fn tabular_section(&self, object: NodeId, name: &str) -> Option<NodeId> {
        self.find_child(object, name, |k| matches!(k, MetadataNodeKind::TabularSection))
    }

    /// Табличная часть объекта: существующая или новая, без предупреждений
    pub fn ensure_tabular_section(&mut self, object: NodeId, name: &str) -> NodeId {
        if let Some(id) = self.tabular_section(object, name) {
            return id;
        }
        self.alloc(MetadataNode {
            name: name.to_string(),
            kind: MetadataNodeKind::TabularSection,
            parent: Some(object),
            children: Vec::new(),
        })
    }

    /// Новая табличная часть; повтор имени дает предупреждение и существующий узел
    pub fn add_tabular_section(&mut self, object: NodeId, name: &str) -> NodeId {
        if let Some(id) = self.tabular_section(object, name) {
            let message = format!(
                "Tabular section {} is already declared in {}",
                name,
                self.node(object).name
            );
            self.diagnostics.warn(DiagnosticKind::DuplicateName, message);
            return id;
        }
        self.ensure_tabular_section(object, name)
    }

    /// Ссылка на форму; повторы молча отбрасываются
    pub fn add_form(&mut self, object: NodeId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty()
            || self
                .find_child(object, name, |k| matches!(k, MetadataNodeKind::Form))
                .is_some()
        {
            return false;
        }
        self.alloc(MetadataNode {
            name: name.to_string(),
            kind: MetadataNodeKind::Form,
            parent: Some(object),
            children: Vec::new(),
        });
        true
    }

    fn attributes_of(&self, scope: NodeId) -> Vec<Attribute> {
        self.node(scope)
            .children
            .iter()
            .filter_map(|id| match &self.node(*id).kind {
                MetadataNodeKind::Attribute(attr) => Some(attr.clone()),
                _ => None,
            })
            .collect()
    }

    /// Собирает объект из поддерева; `None`, если узел не объект
    pub fn object(&self, id: NodeId) -> Option<ConfigurationObject> {
        let node = self.node(id);
        let MetadataNodeKind::Object { kind, comment } = &node.kind else {
            return None;
        };

        let mut tabular_sections = Vec::new();
        let mut forms = Vec::new();
        for child in &node.children {
            let child_node = self.node(*child);
            match child_node.kind {
                MetadataNodeKind::TabularSection => tabular_sections.push(TabularSection {
                    name: child_node.name.clone(),
                    columns: self.attributes_of(*child),
                }),
                MetadataNodeKind::Form => forms.push(child_node.name.clone()),
                _ => {}
            }
        }

        Some(ConfigurationObject {
            kind: kind.clone(),
            name: node.name.clone(),
            comment: comment.clone(),
            attributes: self.attributes_of(id),
            tabular_sections,
            forms,
        })
    }

    /// Все объекты в порядке объявления
    pub fn objects(&self) -> Vec<ConfigurationObject> {
        self.roots.iter().filter_map(|id| self.object(*id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::objects::KnownKind;
    use crate::configuration::type_normalizer::TypeNormalizer;

    fn attr(name: &str, raw: &str) -> Attribute {
        Attribute::new(name, Some(raw.to_string()), TypeNormalizer::new().describe(raw))
    }

    #[test]
    fn test_columns_do_not_leak_into_object() {
        let mut tree = MetadataTree::new();
        let obj = tree.add_object(ObjectKind::Known(KnownKind::Catalog), "Контрагенты");
        tree.add_attribute(obj, attr("Наименование", "xs:string"));
        let ts = tree.add_tabular_section(obj, "БанковскиеСчета");
        tree.add_attribute(ts, attr("Банк", "cfg:CatalogRef.Банки"));

        let object = tree.object(obj).unwrap();
        assert_eq!(object.attributes.len(), 1);
        assert_eq!(object.tabular_sections[0].columns[0].normalized_type, "СправочникСсылка.Банки");
    }

    #[test]
    fn test_duplicate_attribute_rejected_with_warning() {
        let mut tree = MetadataTree::new();
        let obj = tree.add_object(ObjectKind::Known(KnownKind::Document), "Заказ");
        assert!(tree.add_attribute(obj, attr("Сумма", "xs:decimal")).is_some());
        assert!(tree.add_attribute(obj, attr("Сумма", "xs:string")).is_none());

        let object = tree.object(obj).unwrap();
        assert_eq!(object.attributes.len(), 1);
        assert_eq!(object.attributes[0].normalized_type, "Число");
        assert_eq!(tree.diagnostics().count_of(DiagnosticKind::DuplicateName), 1);
    }

    #[test]
    fn test_same_name_allowed_in_different_scopes() {
        let mut tree = MetadataTree::new();
        let obj = tree.add_object(ObjectKind::Known(KnownKind::Document), "Заказ");
        tree.add_attribute(obj, attr("Сумма", "xs:decimal"));
        let ts = tree.ensure_tabular_section(obj, "Товары");
        assert!(tree.add_attribute(ts, attr("Сумма", "xs:decimal")).is_some());
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn test_forms_deduplicated_in_first_seen_order() {
        let mut tree = MetadataTree::new();
        let obj = tree.add_object(ObjectKind::Known(KnownKind::Catalog), "Банки");
        assert!(tree.add_form(obj, "ФормаЭлемента"));
        assert!(tree.add_form(obj, "ФормаСписка"));
        assert!(!tree.add_form(obj, "ФормаЭлемента"));
        assert_eq!(tree.object(obj).unwrap().forms, vec!["ФормаЭлемента", "ФормаСписка"]);
    }

    #[test]
    fn test_attribute_under_form_is_rejected() {
        let mut tree = MetadataTree::new();
        let obj = tree.add_object(ObjectKind::Known(KnownKind::Catalog), "Банки");
        tree.add_form(obj, "ФормаЭлемента");
        let form = tree.node(obj).children[0];
        assert!(tree.add_attribute(form, attr("Код", "xs:string")).is_none());
    }
}
