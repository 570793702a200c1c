/*!
# Configuration Report Parser

Парсер текстового отчета по конфигурации 1С
("Конфигурация" -> "Отчет по конфигурации", выгрузка в .txt).

Отчет представляет дерево через отступы: каждая строка узла начинается
с серии маркеров (табуляции/пробелы и `-`), строки свойств (`Тип:`,
`Комментарий:`) относятся к последнему узлу.

```text
-Справочники.Контрагенты
	Комментарий: "Контрагенты (задача 104512)"
	-Справочники.Контрагенты.Реквизиты.ИНН
		Тип:
			Строка(12)
	-Справочники.Контрагенты.ТабличныеЧасти.БанковскиеСчета
		-Справочники.Контрагенты.ТабличныеЧасти.БанковскиеСчета.Реквизиты.Банк
			Тип: СправочникСсылка.Банки
```

Разбор идет в два шага: строки -> `ReportTree` (арена узлов с глубиной),
затем `ReportTree` -> `MetadataTree` (объекты, реквизиты, табличные части, формы).
*/

use std::path::{Path, PathBuf};

use super::arena::{MetadataTree, NodeId};
use super::metadata_parser::CONSTANT_VALUE_ATTRIBUTE;
use super::objects::{Attribute, ConfigurationObject, KnownKind, ObjectKind};
use super::type_normalizer::TypeNormalizer;
use crate::core::{
    read_text_file, ContractError, ContractResult, Diagnostic, DiagnosticCollector, DiagnosticKind,
};

/// Ширина одного уровня отступа по умолчанию
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Коллекции, содержимое которых становится реквизитами
const ATTRIBUTE_COLLECTIONS: &[&str] = &["Реквизиты", "Измерения", "Ресурсы"];
const TABULAR_SECTIONS: &str = "ТабличныеЧасти";
const FORMS: &str = "Формы";

/// Идентификатор узла отчета
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportNodeId(pub u32);

/// Узел отчета: одна строка-маркер со свойствами
#[derive(Debug, Clone, PartialEq)]
pub struct ReportNode {
    /// Фактическая глубина после исправления скачков
    pub depth: usize,
    /// Номер строки (с единицы)
    pub line: usize,
    pub text: String,
    pub comment: Option<String>,
    pub type_token: Option<String>,
    pub parent: Option<ReportNodeId>,
    pub children: Vec<ReportNodeId>,
}

/// Лес узлов отчета в порядке следования строк
#[derive(Debug, Default, Clone)]
pub struct ReportTree {
    nodes: Vec<ReportNode>,
    roots: Vec<ReportNodeId>,
    diagnostics: DiagnosticCollector,
}

impl ReportTree {
    pub fn node(&self, id: ReportNodeId) -> &ReportNode {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: ReportNodeId) -> &mut ReportNode {
        &mut self.nodes[id.0 as usize]
    }

    pub fn roots(&self) -> &[ReportNodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticCollector {
        std::mem::take(&mut self.diagnostics)
    }

    fn push(&mut self, node: ReportNode) -> ReportNodeId {
        let id = ReportNodeId(self.nodes.len() as u32);
        match node.parent {
            Some(parent) => self.node_mut(parent).children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(node);
        id
    }
}

/// Результат разбора отчета
#[derive(Debug, Clone, Default)]
pub struct ReportParseResult {
    pub objects: Vec<ConfigurationObject>,
    pub diagnostics: DiagnosticCollector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropertyKind {
    Comment,
    Type,
}

const PROPERTY_PREFIXES: &[(&str, PropertyKind)] = &[
    ("комментарий:", PropertyKind::Comment),
    ("comment:", PropertyKind::Comment),
    ("тип:", PropertyKind::Type),
    ("type:", PropertyKind::Type),
];

/// Разбор префикса строки: глубина узла и признак маркера `-`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LinePrefix {
    depth: usize,
    /// Визуальная ширина префикса в колонках
    columns: usize,
    bulleted: bool,
    len: usize,
}

/// Парсер текстового отчета
#[derive(Debug, Clone)]
pub struct ReportTreeParser {
    indent_width: usize,
    normalizer: TypeNormalizer,
}

impl Default for ReportTreeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportTreeParser {
    pub fn new() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            normalizer: TypeNormalizer::new(),
        }
    }

    pub fn with_indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width.max(1);
        self
    }

    pub fn with_normalizer(mut self, normalizer: TypeNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Читает файл отчета (с определением кодировки) и разбирает его
    pub fn parse_file(&self, path: &Path) -> ContractResult<ReportParseResult> {
        tracing::info!("Parsing configuration report: {}", path.display());
        let decoded = read_text_file(path)?;
        tracing::debug!("Report decoded as {}", decoded.encoding);

        let mut result = self.parse_report(&decoded.text);
        result.diagnostics.attach_path(path);
        tracing::info!("Parsed {} metadata objects from report", result.objects.len());
        Ok(result)
    }

    /// Текст отчета -> объекты конфигурации
    pub fn parse_report(&self, text: &str) -> ReportParseResult {
        let mut report = self.build_tree(text);
        let mut metadata = self.lower(&report);

        let mut diagnostics = report.take_diagnostics();
        diagnostics.merge(metadata.take_diagnostics());
        ReportParseResult {
            objects: metadata.objects(),
            diagnostics,
        }
    }

    fn measure_prefix(&self, line: &str) -> LinePrefix {
        let mut whitespace_columns = 0usize;
        let mut columns = 0usize;
        let mut dash_runs = 0usize;
        let mut in_dash_run = false;
        let mut len = 0usize;

        for ch in line.chars() {
            match ch {
                ' ' | '\t' => {
                    let width = if ch == '\t' { self.indent_width } else { 1 };
                    if dash_runs == 0 {
                        whitespace_columns += width;
                    }
                    columns += width;
                    in_dash_run = false;
                }
                '-' => {
                    if !in_dash_run {
                        dash_runs += 1;
                    }
                    in_dash_run = true;
                    columns += 1;
                }
                _ => break,
            }
            len += ch.len_utf8();
        }

        LinePrefix {
            depth: whitespace_columns / self.indent_width + dash_runs.saturating_sub(1),
            columns,
            bulleted: dash_runs > 0,
            len,
        }
    }

    /// Строки отчета -> лес узлов
    pub fn build_tree(&self, text: &str) -> ReportTree {
        let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
        let mut tree = ReportTree::default();
        // Открытые узлы вместе с их исходной глубиной из отступа
        let mut open: Vec<(ReportNodeId, usize)> = Vec::new();
        let mut current: Option<ReportNodeId> = None;
        let mut i = 0usize;

        while i < lines.len() {
            let line = lines[i];
            let line_no = i + 1;
            i += 1;

            if line.trim().is_empty() {
                continue;
            }

            let prefix = self.measure_prefix(line);
            let body = line[prefix.len..].trim();
            if body.is_empty() {
                continue;
            }

            if !prefix.bulleted {
                if let Some((kind, value)) = split_property(body) {
                    let value = match (kind, value.is_empty()) {
                        (PropertyKind::Type, true) => {
                            let (parts, consumed) =
                                self.collect_type_parts(&lines[i..], prefix.columns);
                            i += consumed;
                            parts
                        }
                        _ => strip_quotes(value).to_string(),
                    };
                    self.attach_property(&mut tree, current, kind, value, line_no);
                    continue;
                }
                if looks_like_other_property(body) {
                    tracing::trace!("Skipping report line {}: {}", line_no, body);
                    continue;
                }
            }

            let raw_depth = prefix.depth;
            let mut sibling_seen = false;
            while let Some(&(_, open_depth)) = open.last() {
                if open_depth < raw_depth {
                    break;
                }
                sibling_seen |= open_depth == raw_depth;
                open.pop();
            }

            let parent = open.last().map(|(id, _)| *id);
            let expected = open.last().map_or(0, |(_, d)| d + 1);
            // Скачок отмечается один раз, соседи на той же глубине идут следом молча
            if raw_depth > expected && !sibling_seen {
                let diagnostic = Diagnostic::warning(
                    DiagnosticKind::MalformedDepth,
                    format!(
                        "Depth jumps to {} where {} is expected; attached to the nearest open node",
                        raw_depth, expected
                    ),
                )
                .with_line(line_no);
                tree.diagnostics.push(diagnostic);
            }

            let id = tree.push(ReportNode {
                depth: open.len(),
                line: line_no,
                text: body.to_string(),
                comment: None,
                type_token: None,
                parent,
                children: Vec::new(),
            });
            open.push((id, raw_depth));
            current = Some(id);
        }

        tracing::debug!("Report tree: {} nodes, {} roots", tree.len(), tree.roots.len());
        tree
    }

    // Строки глубже строки `Тип:` образуют составной тип
    fn collect_type_parts(&self, rest: &[&str], property_columns: usize) -> (String, usize) {
        let mut parts = Vec::new();
        let mut consumed = 0usize;
        for line in rest {
            if line.trim().is_empty() {
                break;
            }
            let prefix = self.measure_prefix(line);
            let body = line[prefix.len..].trim();
            if prefix.bulleted
                || prefix.columns <= property_columns
                || split_property(body).is_some()
            {
                break;
            }
            let part = body.trim_matches(|c| c == '"' || c == ',').trim();
            if !part.is_empty() {
                parts.push(part.to_string());
            }
            consumed += 1;
        }
        (parts.join(", "), consumed)
    }

    fn attach_property(
        &self,
        tree: &mut ReportTree,
        current: Option<ReportNodeId>,
        kind: PropertyKind,
        value: String,
        line_no: usize,
    ) {
        let Some(node) = current else {
            tree.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::OrphanProperty,
                    format!("Property before the first node is ignored: {}", value),
                )
                .with_line(line_no),
            );
            return;
        };
        if value.is_empty() {
            return;
        }
        let node = tree.node_mut(node);
        match kind {
            PropertyKind::Comment => node.comment = Some(value),
            PropertyKind::Type => node.type_token = Some(value),
        }
    }

    /// Лес узлов -> дерево метаданных
    pub fn lower(&self, report: &ReportTree) -> MetadataTree {
        let mut metadata = MetadataTree::new();
        let mut last_object: Option<(NodeId, String)> = None;

        for root in report.roots() {
            let node = report.node(*root);
            if let Some((kind, name)) = parse_object_header(&node.text) {
                let is_constant = kind == ObjectKind::Known(KnownKind::Constant);
                let object = metadata.add_object(kind, name);
                if node.comment.is_some() {
                    metadata.set_comment(object, node.comment.clone());
                }
                if is_constant && node.type_token.is_some() {
                    let value = self.attribute_from(node, CONSTANT_VALUE_ATTRIBUTE);
                    metadata.add_attribute(object, value);
                }
                let full_name = node.text.clone();
                for child in &node.children {
                    self.lower_node(report, *child, &mut metadata, object, &full_name, None);
                }
                last_object = Some((object, full_name));
                continue;
            }

            // Плоский отчет: все строки на нулевой глубине, полные имена
            match &last_object {
                Some((object, full_name)) if node.text.starts_with(&format!("{}.", full_name)) => {
                    let (object, full_name) = (*object, full_name.clone());
                    self.lower_node(report, *root, &mut metadata, object, &full_name, None);
                }
                _ => tracing::debug!("Skipping report root at line {}: {}", node.line, node.text),
            }
        }

        metadata
    }

    fn lower_node(
        &self,
        report: &ReportTree,
        id: ReportNodeId,
        metadata: &mut MetadataTree,
        object: NodeId,
        full_name: &str,
        section: Option<NodeId>,
    ) {
        let node = report.node(id);
        let relative = node
            .text
            .strip_prefix(full_name)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&node.text);
        let segments: Vec<&str> = relative.split('.').collect();

        match segments.as_slice() {
            [collection, name] if ATTRIBUTE_COLLECTIONS.contains(collection) => {
                let scope = section.unwrap_or(object);
                metadata.add_attribute(scope, self.attribute_from(node, name));
            }
            [collection, section_name] if *collection == TABULAR_SECTIONS => {
                let section_id = metadata.add_tabular_section(object, section_name);
                for child in &node.children {
                    self.lower_node(report, *child, metadata, object, full_name, Some(section_id));
                }
            }
            [sections, section_name, collection, column]
                if *sections == TABULAR_SECTIONS && ATTRIBUTE_COLLECTIONS.contains(collection) =>
            {
                let section_id = metadata.ensure_tabular_section(object, section_name);
                metadata.add_attribute(section_id, self.attribute_from(node, column));
            }
            [collection, form] if *collection == FORMS => {
                metadata.add_form(object, form);
            }
            _ => tracing::trace!("Ignoring report node at line {}: {}", node.line, node.text),
        }
    }

    fn attribute_from(&self, node: &ReportNode, name: &str) -> Attribute {
        let descriptor = self.normalizer.describe_opt(node.type_token.as_deref());
        Attribute::new(name, node.type_token.clone(), descriptor).with_comment(node.comment.clone())
    }

    /// Ищет файл отчета конфигурации в директории
    pub fn find_configuration_report(config_dir: &Path) -> ContractResult<Option<PathBuf>> {
        tracing::debug!("Looking for configuration report in: {}", config_dir.display());

        let report_names = [
            "ConfigurationReport.txt",
            "config_report.txt",
            "отчет_конфигурации.txt",
            "structure_report.txt",
            "metadata_report.txt",
        ];
        for name in &report_names {
            let report_path = config_dir.join(name);
            if report_path.is_file() {
                tracing::info!("Found configuration report: {}", report_path.display());
                return Ok(Some(report_path));
            }
        }

        let entries = std::fs::read_dir(config_dir).map_err(|e| ContractError::io(config_dir, e))?;
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("txt"))
            .collect();
        candidates.sort();

        for path in candidates {
            let Ok(decoded) = read_text_file(&path) else {
                continue;
            };
            let has_objects = decoded
                .text
                .lines()
                .take(200)
                .any(|line| {
                    parse_object_header(line.trim_start_matches(['\t', ' ', '-'])).is_some()
                });
            if has_objects {
                tracing::info!("Found potential configuration report: {}", path.display());
                return Ok(Some(path));
            }
        }

        tracing::warn!("No configuration report found in: {}", config_dir.display());
        Ok(None)
    }
}

/// `Справочники.Контрагенты` -> (Справочник, "Контрагенты")
pub fn parse_object_header(text: &str) -> Option<(ObjectKind, &str)> {
    let (root, name) = text.trim().split_once('.')?;
    if name.is_empty() || name.contains('.') {
        return None;
    }
    ObjectKind::from_report_root(root).map(|kind| (kind, name))
}

fn split_property(body: &str) -> Option<(PropertyKind, &str)> {
    PROPERTY_PREFIXES.iter().find_map(|(prefix, kind)| {
        let head = body.get(..prefix.len())?;
        (head.to_lowercase() == *prefix).then(|| (*kind, body[prefix.len()..].trim()))
    })
}

// `Синоним: ...`, `Индексирование: ...` и прочие свойства отчета без значения для контрактов
fn looks_like_other_property(body: &str) -> bool {
    match body.split_once(':') {
        Some((key, _)) => !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == ' '),
        None => false,
    }
}

fn strip_quotes(value: &str) -> &str {
    value.trim().trim_matches('"').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REPORT: &str = "\
-Справочники.Контрагенты
\tКомментарий: \"Контрагенты (задача 104512)\"
\t-Справочники.Контрагенты.Реквизиты.Наименование
\t\tТип: Строка(150)
\t-Справочники.Контрагенты.ТабличныеЧасти.БанковскиеСчета
\t\t-Справочники.Контрагенты.ТабличныеЧасти.БанковскиеСчета.Реквизиты.Банк
\t\t\tТип:
\t\t\t\t\"СправочникСсылка.Банки\",
\t-Справочники.Контрагенты.Формы.ФормаЭлемента
";

    #[test]
    fn test_depth_from_markers() {
        let parser = ReportTreeParser::new();
        assert_eq!(parser.measure_prefix("-X").depth, 0);
        assert_eq!(parser.measure_prefix("\t-X").depth, 1);
        assert_eq!(parser.measure_prefix("        -X").depth, 2);
        assert_eq!(parser.measure_prefix("- - X").depth, 1);
        assert_eq!(parser.measure_prefix("- - - X").depth, 2);
        assert!(!parser.measure_prefix("\tТип: X").bulleted);
    }

    #[test]
    fn test_tree_structure_and_properties() {
        let parser = ReportTreeParser::new();
        let tree = parser.build_tree(REPORT);
        assert_eq!(tree.roots().len(), 1);

        let root = tree.node(tree.roots()[0]);
        assert_eq!(root.comment.as_deref(), Some("Контрагенты (задача 104512)"));
        assert_eq!(root.children.len(), 3);

        let section = tree.node(root.children[1]);
        let column = tree.node(section.children[0]);
        assert_eq!(column.type_token.as_deref(), Some("СправочникСсылка.Банки"));
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn test_report_lowering() {
        let result = ReportTreeParser::new().parse_report(REPORT);
        assert_eq!(result.objects.len(), 1);

        let object = &result.objects[0];
        assert_eq!(object.kind, ObjectKind::Known(KnownKind::Catalog));
        assert_eq!(object.name, "Контрагенты");
        assert_eq!(object.attributes.len(), 1);
        assert_eq!(object.attributes[0].normalized_type, "Строка");
        assert_eq!(object.attributes[0].length, Some(150));
        assert_eq!(object.tabular_sections[0].columns[0].name, "Банк");
        assert_eq!(object.forms, vec!["ФормаЭлемента"]);
    }

    #[test]
    fn test_multiline_composite_type() {
        let text = "\
-Документы.Заказ
\t-Документы.Заказ.Реквизиты.Основание
\t\tТип:
\t\t\t\"ДокументСсылка.Счет\",
\t\t\t\"ДокументСсылка.Договор\"
\t-Документы.Заказ.Реквизиты.Сумма
\t\tТип: Число(15,2)
";
        let result = ReportTreeParser::new().parse_report(text);
        let object = &result.objects[0];
        assert_eq!(
            object.attributes[0].normalized_type,
            "ДокументСсылка.Счет, ДокументСсылка.Договор"
        );
        assert_eq!(object.attributes[1].normalized_type, "Число");
        assert_eq!(object.attributes[1].precision, Some(2));
    }

    #[test]
    fn test_depth_jump_attaches_to_nearest_open_node() {
        let text = "\
-Справочники.Банки
\t\t\t-Справочники.Банки.Реквизиты.БИК
\t-Справочники.Банки.Реквизиты.Город
";
        let parser = ReportTreeParser::new();
        let tree = parser.build_tree(text);
        assert_eq!(tree.diagnostics().count_of(DiagnosticKind::MalformedDepth), 1);
        assert_eq!(tree.diagnostics().diagnostics[0].line, Some(2));

        let root = tree.node(tree.roots()[0]);
        assert_eq!(root.children.len(), 2);
        assert_eq!(tree.node(root.children[0]).depth, 1);

        let result = parser.parse_report(text);
        let names: Vec<_> = result.objects[0].attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["БИК", "Город"]);
    }

    #[test]
    fn test_over_indented_siblings_stay_siblings() {
        let text = "\
Справочники.Банки
        Реквизиты.БИК
        Реквизиты.Город
        Реквизиты.Адрес
";
        let parser = ReportTreeParser::new();
        let tree = parser.build_tree(text);
        let root = tree.node(tree.roots()[0]);
        assert_eq!(root.children.len(), 3);
        assert!(root.children.iter().all(|c| tree.node(*c).depth == 1));
        assert_eq!(tree.diagnostics().count_of(DiagnosticKind::MalformedDepth), 1);

        let result = parser.parse_report(text);
        let names: Vec<_> = result.objects[0].attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["БИК", "Город", "Адрес"]);
    }

    #[test]
    fn test_over_indented_siblings_with_dash_markers() {
        let text = "\
-Справочники.Банки
\t\t-Справочники.Банки.Реквизиты.БИК
\t\t\tТип: Строка(9)
\t\t-Справочники.Банки.Реквизиты.Город
\t\t-Справочники.Банки.ТабличныеЧасти.Счета
\t\t\t-Справочники.Банки.ТабличныеЧасти.Счета.Реквизиты.Номер
\t-Справочники.Банки.Формы.ФормаЭлемента
";
        let result = ReportTreeParser::new().parse_report(text);
        let object = &result.objects[0];
        let names: Vec<_> = object.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["БИК", "Город"]);
        assert_eq!(object.attributes[0].length, Some(9));
        assert_eq!(object.tabular_sections[0].columns[0].name, "Номер");
        assert_eq!(object.forms, vec!["ФормаЭлемента"]);
        assert_eq!(result.diagnostics.count_of(DiagnosticKind::MalformedDepth), 1);
    }

    #[test]
    fn test_report_with_every_node_over_indented() {
        let text = "\
\t-Справочники.Банки
\t\t-Справочники.Банки.Реквизиты.БИК
\t-Справочники.Валюты
\t\t-Справочники.Валюты.Реквизиты.Код
";
        let parser = ReportTreeParser::new();
        let tree = parser.build_tree(text);
        assert_eq!(tree.roots().len(), 2);
        assert_eq!(tree.diagnostics().count_of(DiagnosticKind::MalformedDepth), 1);

        let result = parser.parse_report(text);
        let names: Vec<_> = result.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Банки", "Валюты"]);
        assert_eq!(result.objects[1].attributes[0].name, "Код");
    }

    #[test]
    fn test_constant_type_becomes_value_attribute() {
        let text = "\
-Константы.ОсновнаяВалюта
\tТип: СправочникСсылка.Валюты
-Константы.БезТипа
";
        let result = ReportTreeParser::new().parse_report(text);
        let currency = &result.objects[0];
        assert_eq!(currency.attributes.len(), 1);
        assert_eq!(currency.attributes[0].name, CONSTANT_VALUE_ATTRIBUTE);
        assert_eq!(currency.attributes[0].normalized_type, "СправочникСсылка.Валюты");
        assert!(result.objects[1].attributes.is_empty());
    }

    #[test]
    fn test_find_report_by_well_known_name() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a_notes.txt"), "-Справочники.Банки\n").unwrap();
        let well_known = temp.path().join("ConfigurationReport.txt");
        std::fs::write(&well_known, "-Справочники.Банки\n").unwrap();

        let found = ReportTreeParser::find_configuration_report(temp.path()).unwrap();
        assert_eq!(found, Some(well_known));
    }

    #[test]
    fn test_find_report_by_object_header() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a_readme.txt"), "Выгрузка от 01.02.2024\n").unwrap();
        std::fs::write(
            temp.path().join("b_export.txt"),
            "Отчет по конфигурации\n\n-Документы.Заказ\n\t-Документы.Заказ.Реквизиты.Сумма\n",
        )
        .unwrap();

        let found = ReportTreeParser::find_configuration_report(temp.path()).unwrap();
        assert_eq!(found, Some(temp.path().join("b_export.txt")));
    }

    #[test]
    fn test_find_report_returns_none_without_candidates() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("readme.txt"), "Просто текст\n").unwrap();
        std::fs::write(temp.path().join("Справочники.Банки.xml"), "<Catalog/>").unwrap();

        assert_eq!(ReportTreeParser::find_configuration_report(temp.path()).unwrap(), None);
        assert!(ReportTreeParser::find_configuration_report(&temp.path().join("нет")).is_err());
    }

    #[test]
    fn test_orphan_property_is_reported() {
        let text = "Тип: Строка\n-Справочники.Банки\n";
        let result = ReportTreeParser::new().parse_report(text);
        assert_eq!(result.diagnostics.count_of(DiagnosticKind::OrphanProperty), 1);
        assert_eq!(result.objects.len(), 1);
    }

    #[test]
    fn test_flat_report_with_full_names() {
        let text = "\
-Справочники.Банки
-Справочники.Банки.Реквизиты.БИК
-Справочники.Банки.ТабличныеЧасти.Счета
-Справочники.Банки.ТабличныеЧасти.Счета.Реквизиты.Номер
-Константы.ОсновнаяВалюта
";
        let result = ReportTreeParser::new().parse_report(text);
        assert_eq!(result.objects.len(), 2);
        assert_eq!(result.objects[0].attributes.len(), 1);
        assert_eq!(result.objects[0].tabular_sections[0].columns[0].name, "Номер");
    }

    #[test]
    fn test_unknown_roots_and_nodes_are_ignored() {
        let text = "\
-Подсистемы.Продажи
\t-Подсистемы.Продажи.Состав
-Справочники.Банки
\t-Справочники.Банки.Команды.Открыть
\t\t-Справочники.Банки.Команды.Открыть.Реквизиты.Х
\t-Справочники.Банки.Реквизиты.Код
\t\tСиноним: \"Код банка\"
";
        let result = ReportTreeParser::new().parse_report(text);
        assert_eq!(result.objects.len(), 1);
        let names: Vec<_> = result.objects[0].attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Код"]);
    }

    #[test]
    fn test_property_prefixes_case_insensitive() {
        assert_eq!(split_property("ТИП: Булево"), Some((PropertyKind::Type, "Булево")));
        assert_eq!(split_property("comment: x"), Some((PropertyKind::Comment, "x")));
        assert_eq!(split_property("Синоним: x"), None);
    }
}
