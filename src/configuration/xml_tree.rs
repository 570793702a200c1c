//! Дерево XML элементов с разрешенными пространствами имен.
//!
//! Документ читается `quick_xml::NsReader` целиком в арену элементов,
//! после чего парсеры объектов и форм обходят его через `ElementId`
//! без повторного чтения и без ссылок между узлами.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::core::{ContractError, ContractResult};

pub const MDCLASSES_NS: &str = "http://v8.1c.ru/8.3/MDClasses";
pub const CORE_NS: &str = "http://v8.1c.ru/8.1/data/core";
pub const LOGFORM_NS: &str = "http://v8.1c.ru/8.3/xcf/logform";

/// Пространства имен выгрузки, передаются парсерам явно
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNamespaces {
    pub metadata: String,
    pub core: String,
    pub form: String,
}

impl Default for XmlNamespaces {
    fn default() -> Self {
        Self {
            metadata: MDCLASSES_NS.to_string(),
            core: CORE_NS.to_string(),
            form: LOGFORM_NS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// URI пространства имен; `None` для имен без привязки
    pub namespace: Option<String>,
    pub local_name: String,
    /// Атрибуты по локальному имени, в порядке документа (без xmlns)
    pub attributes: Vec<(String, String)>,
    /// Собственный текст элемента (без текста потомков)
    pub text: String,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
}

impl XmlElement {
    /// Совпадение по локальному имени и пространству имен; непривязанные имена подходят всегда
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name
            && self.namespace.as_deref().map_or(true, |ns| ns == namespace)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    elements: Vec<XmlElement>,
    root: ElementId,
}

impl XmlDocument {
    /// Разбирает документ; `path` нужен только для текста ошибок
    pub fn parse(text: &str, path: &Path) -> ContractResult<Self> {
        let mut reader = NsReader::from_str(text);
        reader.trim_text(true);

        let mut elements: Vec<XmlElement> = Vec::new();
        let mut stack: Vec<ElementId> = Vec::new();
        let mut root: Option<ElementId> = None;

        loop {
            let position = reader.buffer_position();
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|e| ContractError::parse(path, format!("{} at byte {}", e, position)))?;
            let namespace = match resolved {
                ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
                _ => None,
            };

            match event {
                Event::Start(start) => {
                    let id =
                        open_element(&mut elements, &stack, &mut root, namespace, &start, path)?;
                    stack.push(id);
                }
                Event::Empty(start) => {
                    open_element(&mut elements, &stack, &mut root, namespace, &start, path)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(t) => {
                    if let Some(current) = stack.last() {
                        let text = t.unescape().map_err(|e| ContractError::parse(path, e))?;
                        elements[current.0 as usize].text.push_str(&text);
                    }
                }
                Event::CData(c) => {
                    if let Some(current) = stack.last() {
                        let raw = c.into_inner();
                        elements[current.0 as usize]
                            .text
                            .push_str(&String::from_utf8_lossy(&raw));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ContractError::parse(
                path,
                format!(
                    "unexpected end of document inside <{}>",
                    elements[open.0 as usize].local_name
                ),
            ));
        }
        let root = root.ok_or_else(|| ContractError::parse(path, "document has no root element"))?;
        Ok(Self { elements, root })
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn element(&self, id: ElementId) -> &XmlElement {
        &self.elements[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn children(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.element(id).children.iter().copied()
    }

    /// Первый прямой потомок с данным именем
    pub fn child(&self, id: ElementId, namespace: &str, local_name: &str) -> Option<ElementId> {
        self.children(id)
            .find(|child| self.element(*child).is(namespace, local_name))
    }

    /// Прямые потомки с данным именем, в порядке документа
    pub fn children_named<'a>(
        &'a self,
        id: ElementId,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = ElementId> + 'a {
        self.children(id)
            .filter(move |child| self.element(*child).is(namespace, local_name))
    }

    /// Спуск по цепочке имен в одном пространстве: `Properties/Name`
    pub fn path(&self, id: ElementId, namespace: &str, steps: &[&str]) -> Option<ElementId> {
        steps
            .iter()
            .try_fold(id, |current, step| self.child(current, namespace, step))
    }

    /// Все потомки в прямом порядке обхода (сам элемент не входит)
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut pending: Vec<ElementId> = self.element(id).children.iter().rev().copied().collect();
        while let Some(current) = pending.pop() {
            result.push(current);
            pending.extend(self.element(current).children.iter().rev().copied());
        }
        result
    }

    /// Обрезанный собственный текст; `None`, если пусто
    pub fn text(&self, id: ElementId) -> Option<&str> {
        let text = self.element(id).text.trim();
        (!text.is_empty()).then_some(text)
    }
}

fn open_element(
    elements: &mut Vec<XmlElement>,
    stack: &[ElementId],
    root: &mut Option<ElementId>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
    path: &Path,
) -> ContractResult<ElementId> {
    let local_name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ContractError::parse(path, e))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ContractError::parse(path, e))?
            .into_owned();
        attributes.push((key, value));
    }

    let id = ElementId(elements.len() as u32);
    let parent = stack.last().copied();
    match parent {
        Some(parent) => elements[parent.0 as usize].children.push(id),
        None if root.is_some() => {
            return Err(ContractError::parse(
                path,
                format!("second root element <{}>", local_name),
            ));
        }
        None => *root = Some(id),
    }
    elements.push(XmlElement {
        namespace,
        local_name,
        attributes,
        text: String::new(),
        parent,
        children: Vec::new(),
    });
    Ok(id)
}
