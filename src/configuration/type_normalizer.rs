/*!
# Type Normalizer

Приведение сырых обозначений типов (`xs:boolean`, `cfg:CatalogRef.Банки`,
`Строка(150)`) к единому отображаемому виду (`Булево`,
`СправочникСсылка.Банки`, `Строка`).

Таблица правил упорядочена, срабатывает первое подходящее правило:
- точное совпадение заменяет токен целиком;
- префикс семейства ссылочных типов заменяется, суффикс (имя объекта) сохраняется;
- всё остальное проходит очистку от известных префиксов пространств имен.

Результат никогда не бывает пустым: нераспознанное значение становится `Undefined`.
*/

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Значение-заглушка для типа, который не удалось определить
pub const UNDEFINED_TYPE: &str = "Undefined";

/// Известные префиксы пространств имен XML выгрузки
pub const KNOWN_NAMESPACE_PREFIXES: &[&str] = &[
    "cfg:", "xs:", "v8:", "v8ui:", "ent:", "xr:", "core:", "app:", "style:", "sys:", "mdclass:",
];

// Автосгенерированные алиасы вида d4p1:
static GENERATED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^d\d+p\d+:").expect("valid generated-prefix regex"));

static QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<base>[^()]+?)\s*\(\s*(?P<len>\d+)\s*(?:,\s*(?P<prec>\d+)\s*)?\)$")
        .expect("valid qualifier regex")
});

/// Чем сопоставляется токен
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypePattern {
    /// Токен совпадает целиком
    Exact(Cow<'static, str>),
    /// Токен начинается с префикса, остаток переносится в результат
    Prefix(Cow<'static, str>),
}

/// Правило нормализации: шаблон и замена
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRule {
    pub pattern: TypePattern,
    pub replacement: Cow<'static, str>,
}

impl TypeRule {
    pub const fn exact(token: &'static str, replacement: &'static str) -> Self {
        Self {
            pattern: TypePattern::Exact(Cow::Borrowed(token)),
            replacement: Cow::Borrowed(replacement),
        }
    }

    pub const fn prefix(prefix: &'static str, replacement: &'static str) -> Self {
        Self {
            pattern: TypePattern::Prefix(Cow::Borrowed(prefix)),
            replacement: Cow::Borrowed(replacement),
        }
    }

    /// Применяет правило; `None`, если токен не подходит
    pub fn apply(&self, token: &str) -> Option<String> {
        match &self.pattern {
            TypePattern::Exact(expected) => {
                (token == expected.as_ref()).then(|| self.replacement.to_string())
            }
            TypePattern::Prefix(prefix) => token
                .strip_prefix(prefix.as_ref())
                .map(|suffix| format!("{}{}", self.replacement, suffix)),
        }
    }
}

/// Встроенная таблица правил, порядок значим
pub static BUILTIN_TYPE_RULES: &[TypeRule] = &[
    // Примитивы
    TypeRule::exact("xs:boolean", "Булево"),
    TypeRule::exact("xs:string", "Строка"),
    TypeRule::exact("xs:decimal", "Число"),
    TypeRule::exact("xs:dateTime", "Дата"),
    TypeRule::exact("xs:base64Binary", "ДвоичныеДанные"),
    TypeRule::exact("v8:ValueStorage", "ХранилищеЗначения"),
    TypeRule::exact("v8:UUID", "УникальныйИдентификатор"),
    TypeRule::exact("v8:Null", "Null"),
    TypeRule::exact("v8:StandardPeriod", "СтандартныйПериод"),
    TypeRule::exact("v8:StandardBeginningDate", "СтандартнаяДатаНачала"),
    TypeRule::exact("v8:FixedArray", "ФиксированныйМассив"),
    TypeRule::exact("v8:ValueTable", "ТаблицаЗначений"),
    TypeRule::exact("v8:ValueListType", "СписокЗначений"),
    TypeRule::exact("v8ui:Color", "Цвет"),
    TypeRule::exact("v8ui:Font", "Шрифт"),
    TypeRule::exact("v8ui:Picture", "Картинка"),
    TypeRule::exact("cfg:AnyRef", "ЛюбаяСсылка"),
    // Ссылочные семейства
    TypeRule::prefix("cfg:CatalogRef.", "СправочникСсылка."),
    TypeRule::prefix("cfg:CatalogObject.", "СправочникОбъект."),
    TypeRule::prefix("cfg:DocumentRef.", "ДокументСсылка."),
    TypeRule::prefix("cfg:DocumentObject.", "ДокументОбъект."),
    TypeRule::prefix("cfg:EnumRef.", "ПеречислениеСсылка."),
    TypeRule::prefix("cfg:ChartOfCharacteristicTypesRef.", "ПланВидовХарактеристикСсылка."),
    TypeRule::prefix("cfg:ChartOfAccountsRef.", "ПланСчетовСсылка."),
    TypeRule::prefix("cfg:ChartOfCalculationTypesRef.", "ПланВидовРасчетаСсылка."),
    TypeRule::prefix("cfg:ExchangePlanRef.", "ПланОбменаСсылка."),
    TypeRule::prefix("cfg:BusinessProcessRef.", "БизнесПроцессСсылка."),
    TypeRule::prefix("cfg:BusinessProcessRoutePointRef.", "ТочкаМаршрутаБизнесПроцессаСсылка."),
    TypeRule::prefix("cfg:TaskRef.", "ЗадачаСсылка."),
    TypeRule::prefix("cfg:InformationRegisterRecordKey.", "РегистрСведенийКлючЗаписи."),
    TypeRule::prefix("cfg:AccumulationRegisterRecordKey.", "РегистрНакопленияКлючЗаписи."),
    TypeRule::prefix("cfg:DefinedType.", "ОпределяемыйТип."),
    TypeRule::prefix("cfg:Characteristic.", "Характеристика."),
];

/// Нормализованный тип вместе с квалификаторами
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub normalized: String,
    pub length: Option<u32>,
    pub precision: Option<u32>,
}

impl TypeDescriptor {
    pub fn undefined() -> Self {
        Self {
            normalized: UNDEFINED_TYPE.to_string(),
            length: None,
            precision: None,
        }
    }
}

/// Normalizes one token against the built-in table.
pub fn normalize_type(token: &str) -> String {
    normalize_with(BUILTIN_TYPE_RULES, token)
}

/// Normalizes one token against an arbitrary ordered rule list.
pub fn normalize_with<'a, I>(rules: I, token: &str) -> String
where
    I: IntoIterator<Item = &'a TypeRule>,
{
    let token = token.trim();
    if token.is_empty() {
        return UNDEFINED_TYPE.to_string();
    }

    let resolved = rules
        .into_iter()
        .find_map(|rule| rule.apply(token))
        .unwrap_or_else(|| strip_namespace_prefixes(token).to_string());

    if resolved.trim().is_empty() {
        UNDEFINED_TYPE.to_string()
    } else {
        resolved
    }
}

/// Убирает все известные префиксы пространств имен, оставляя локальное имя
pub fn strip_namespace_prefixes(token: &str) -> &str {
    let mut rest = token;
    loop {
        let before = rest;
        if let Some(prefix) = KNOWN_NAMESPACE_PREFIXES.iter().find(|p| rest.starts_with(*p)) {
            rest = &rest[prefix.len()..];
        } else if let Some(m) = GENERATED_PREFIX.find(rest) {
            rest = &rest[m.end()..];
        }
        if rest.len() == before.len() {
            return rest;
        }
    }
}

/// Делит составной тип по запятым верхнего уровня (`Число(10,2)` не делится)
pub fn split_composite(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in raw.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(raw[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(raw[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Отделяет квалификаторы: `Строка(150)` -> (`Строка`, 150, None)
pub fn split_qualifiers(token: &str) -> (&str, Option<u32>, Option<u32>) {
    match QUALIFIER.captures(token) {
        Some(caps) => {
            let base = caps.name("base").map(|m| m.as_str()).unwrap_or(token);
            let length = caps.name("len").and_then(|m| m.as_str().parse().ok());
            let precision = caps.name("prec").and_then(|m| m.as_str().parse().ok());
            (base, length, precision)
        }
        None => (token, None, None),
    }
}

/// Нормализатор с таблицей правил: дополнительные правила проверяются раньше встроенных
#[derive(Debug, Clone, Default)]
pub struct TypeNormalizer {
    extra_rules: Vec<TypeRule>,
}

impl TypeNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_rules(extra_rules: Vec<TypeRule>) -> Self {
        Self { extra_rules }
    }

    /// Полная упорядоченная таблица
    pub fn rules(&self) -> impl Iterator<Item = &TypeRule> {
        self.extra_rules.iter().chain(BUILTIN_TYPE_RULES.iter())
    }

    pub fn normalize(&self, token: &str) -> String {
        normalize_with(self.rules(), token)
    }

    /// Нормализует возможно составной тип с квалификаторами
    pub fn describe(&self, raw: &str) -> TypeDescriptor {
        let parts = split_composite(raw);
        match parts.as_slice() {
            [] => TypeDescriptor::undefined(),
            [single] => {
                let (base, length, precision) = split_qualifiers(single);
                TypeDescriptor {
                    normalized: self.normalize(base),
                    length,
                    precision,
                }
            }
            many => {
                let normalized = many
                    .iter()
                    .map(|part| self.normalize(split_qualifiers(part).0))
                    .collect::<Vec<_>>()
                    .join(", ");
                TypeDescriptor {
                    normalized,
                    length: None,
                    precision: None,
                }
            }
        }
    }

    /// То же для необязательного токена: отсутствие дает `Undefined`
    pub fn describe_opt(&self, raw: Option<&str>) -> TypeDescriptor {
        match raw {
            Some(raw) => self.describe(raw),
            None => TypeDescriptor::undefined(),
        }
    }
}
