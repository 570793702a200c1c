/*!
# Pipeline Tests

Разбор -> нормализация -> сборка контрактов без файловой системы.
*/

use std::path::Path;

use onec_contract_generator::configuration::{
    ReportTreeParser, TypeNormalizer, XmlFormParser, XmlObjectParser,
};
use onec_contract_generator::contracts::{to_json, ContractBuilder, FormKind};
use onec_contract_generator::core::{DiagnosticCollector, DiagnosticKind};
use pretty_assertions::assert_eq;

const REPORT: &str = "\
Справочники.Контрагенты
\tКомментарий: \"Покупатели и поставщики\"
\tРеквизиты.Наименование
\t\tТип: Строка
\tТабличныеЧасти.БанковскиеСчета
\t\tРеквизиты.Банк
\t\t\tТип: СправочникСсылка.Банки
";

const CATALOG_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MetaDataObject xmlns="http://v8.1c.ru/8.3/MDClasses" xmlns:v8="http://v8.1c.ru/8.1/data/core" xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <Catalog uuid="1">
    <Properties>
      <Name>Контрагенты</Name>
      <Comment>Покупатели и поставщики</Comment>
    </Properties>
    <ChildObjects>
      <Attribute>
        <Properties><Name>Наименование</Name><Type><v8:Type>xs:string</v8:Type></Type></Properties>
      </Attribute>
      <TabularSection>
        <Properties><Name>БанковскиеСчета</Name></Properties>
        <ChildObjects>
          <Attribute>
            <Properties><Name>Банк</Name><Type><v8:Type>cfg:CatalogRef.Банки</v8:Type></Type></Properties>
          </Attribute>
          <Attribute>
            <Properties><Name>НомерСчета</Name><Type><v8:Type>xs:string</v8:Type></Type></Properties>
          </Attribute>
        </ChildObjects>
      </TabularSection>
      <Attribute>
        <Properties><Name>ИНН</Name><Type><v8:Type>xs:string</v8:Type></Type></Properties>
      </Attribute>
      <Form><Properties><Name>ФормаЭлемента</Name></Properties></Form>
      <Form>ФормаЭлемента</Form>
      <Form>ФормаСписка</Form>
    </ChildObjects>
  </Catalog>
</MetaDataObject>"#;

const ITEM_FORM_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Form xmlns="http://v8.1c.ru/8.3/xcf/logform">
  <ChildItems>
    <InputField name="Наименование" id="1"/>
    <InputField name="инн" id="2"/>
    <Table name="БанковскиеСчета" id="3">
      <ChildItems>
        <InputField name="Банк" id="4"/>
      </ChildItems>
    </Table>
    <Button name="ФормаЗаписать" id="5"/>
  </ChildItems>
</Form>"#;

#[test]
fn report_scenario_builds_expected_contract() {
    let parsed = ReportTreeParser::new().parse_report(REPORT);
    assert!(parsed.diagnostics.is_empty());
    assert_eq!(parsed.objects.len(), 1);

    let mut diagnostics = DiagnosticCollector::new();
    let contract = ContractBuilder::new().build_object(&parsed.objects[0], &mut diagnostics);

    assert_eq!(contract.name, "Контрагенты");
    assert_eq!(contract.object_type, "Справочник");
    assert_eq!(contract.comment.as_deref(), Some("Покупатели и поставщики"));
    assert_eq!(contract.properties.len(), 1);
    assert_eq!(contract.properties[0].name, "Наименование");
    assert_eq!(contract.properties[0].type_name, "Строка");

    assert_eq!(contract.tabular_sections.len(), 1);
    let section = &contract.tabular_sections[0];
    assert_eq!(section.name, "БанковскиеСчета");
    assert_eq!(section.columns.len(), 1);
    assert_eq!(section.columns[0].name, "Банк");
    assert_eq!(section.columns[0].type_name, "СправочникСсылка.Банки");

    assert_eq!(contract.search_info.category, "Catalogs");
    assert_eq!(contract.search_info.full_name, "Catalogs_Контрагенты");
    assert_eq!(
        contract.search_info.keywords,
        vec!["Справочник", "Контрагенты", "покупатели", "и", "поставщики"]
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn report_and_xml_agree_on_structure() {
    let from_report = ReportTreeParser::new().parse_report(REPORT).objects.remove(0);
    let from_xml = XmlObjectParser::default()
        .parse_str(CATALOG_XML, Path::new("Catalogs/Контрагенты.xml"))
        .unwrap()
        .object;

    assert_eq!(from_report.qualified_name(), from_xml.qualified_name());
    assert_eq!(from_report.attributes[0].normalized_type, from_xml.attributes[0].normalized_type);
    assert_eq!(
        from_report.tabular_sections[0].columns[0].normalized_type,
        from_xml.tabular_sections[0].columns[0].normalized_type
    );
}

#[test]
fn tabular_section_columns_stay_out_of_object_attributes() {
    let object = XmlObjectParser::default()
        .parse_str(CATALOG_XML, Path::new("Catalogs/Контрагенты.xml"))
        .unwrap()
        .object;

    let names: Vec<_> = object.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Наименование", "ИНН"]);
    assert!(object.attribute("Банк").is_none());
    assert!(object.attribute("НомерСчета").is_none());

    let columns: Vec<_> = object.tabular_sections[0]
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(columns, vec!["Банк", "НомерСчета"]);
}

#[test]
fn form_names_are_deduplicated_in_first_seen_order() {
    let object = XmlObjectParser::default()
        .parse_str(CATALOG_XML, Path::new("Catalogs/Контрагенты.xml"))
        .unwrap()
        .object;
    assert_eq!(object.forms, vec!["ФормаЭлемента", "ФормаСписка"]);
}

#[test]
fn form_contract_keeps_control_order_and_binds_exact_names() {
    let object = XmlObjectParser::default()
        .parse_str(CATALOG_XML, Path::new("Catalogs/Контрагенты.xml"))
        .unwrap()
        .object;
    let form = XmlFormParser::default()
        .parse_str(ITEM_FORM_XML, "ФормаЭлемента", Path::new("Form.xml"))
        .unwrap()
        .form;

    let mut diagnostics = DiagnosticCollector::new();
    let forms = ContractBuilder::new().build_forms(&object, &[form], &mut diagnostics);
    assert_eq!(forms.len(), 1);

    let contract = &forms[0];
    assert_eq!(contract.form_type, FormKind::Item);
    assert_eq!(contract.object_name, "Справочник.Контрагенты");

    let controls: Vec<_> = contract
        .controls
        .iter()
        .map(|c| (c.name.as_str(), c.binding.as_deref()))
        .collect();
    assert_eq!(
        controls,
        vec![
            ("Наименование", Some("Объект.Наименование")),
            ("инн", None),
            ("БанковскиеСчета", Some("Объект.БанковскиеСчета")),
            ("Банк", Some("Объект.БанковскиеСчета.Банк")),
            ("ФормаЗаписать", None),
        ]
    );

    // ФормаСписка объявлена, но описания нет
    assert_eq!(diagnostics.count_of(DiagnosticKind::UnresolvedReference), 1);
}

#[test]
fn malformed_form_does_not_block_other_forms() {
    let object = XmlObjectParser::default()
        .parse_str(CATALOG_XML, Path::new("Catalogs/Контрагенты.xml"))
        .unwrap()
        .object;
    let parser = XmlFormParser::default();

    let broken = parser.parse_str(
        "<Form><ChildItems><Table name=\"T\">",
        "ФормаСписка",
        Path::new("Form.xml"),
    );
    assert!(broken.is_err());

    let item = parser
        .parse_str(ITEM_FORM_XML, "ФормаЭлемента", Path::new("Form.xml"))
        .unwrap()
        .form;
    let forms =
        ContractBuilder::new().build_forms(&object, &[item], &mut DiagnosticCollector::new());
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].form_name, "ФормаЭлемента");
}

#[test]
fn depth_jump_is_a_warning_not_a_failure() {
    let text = "\
Справочники.Банки
\t\t\tРеквизиты.БИК
\t\t\t\tТип: Строка(9)
\tРеквизиты.Город
";
    let parsed = ReportTreeParser::new().parse_report(text);
    assert_eq!(parsed.diagnostics.count_of(DiagnosticKind::MalformedDepth), 1);

    let names: Vec<_> = parsed.objects[0].attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["БИК", "Город"]);
    assert_eq!(parsed.objects[0].attributes[0].length, Some(9));
}

#[test]
fn over_indented_siblings_are_all_kept() {
    let text = "\
Справочники.Банки
        Реквизиты.БИК
        Реквизиты.Город
        Реквизиты.Адрес
    Формы.ФормаЭлемента
";
    let parsed = ReportTreeParser::new().parse_report(text);
    assert_eq!(parsed.diagnostics.count_of(DiagnosticKind::MalformedDepth), 1);

    let object = &parsed.objects[0];
    let names: Vec<_> = object.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["БИК", "Город", "Адрес"]);
    assert_eq!(object.forms, vec!["ФормаЭлемента"]);
}

#[test]
fn fully_over_indented_report_still_parses() {
    let text = "\
\t\t-Справочники.Банки
\t\t\t-Справочники.Банки.Реквизиты.БИК
\t\t\t-Справочники.Банки.Реквизиты.Город
\t\t-Документы.Заказ
\t\t\t-Документы.Заказ.Реквизиты.Сумма
\t\t\t\tТип: Число(15,2)
";
    let parsed = ReportTreeParser::new().parse_report(text);
    assert_eq!(parsed.diagnostics.count_of(DiagnosticKind::MalformedDepth), 1);

    let summary: Vec<_> = parsed
        .objects
        .iter()
        .map(|o| (o.qualified_name(), o.attributes.len()))
        .collect();
    assert_eq!(
        summary,
        vec![("Справочник.Банки".to_string(), 2), ("Документ.Заказ".to_string(), 1)]
    );
    assert_eq!(parsed.objects[1].attributes[0].precision, Some(2));
}

#[test]
fn report_object_drives_form_bindings() {
    let text = "\
Справочники.Контрагенты
\tРеквизиты.ИНН
\tФормы.ФормаЭлемента
";
    let object = ReportTreeParser::new().parse_report(text).objects.remove(0);
    let form = XmlFormParser::default()
        .parse_str(ITEM_FORM_XML, "ФормаЭлемента", Path::new("Form.xml"))
        .unwrap()
        .form;

    let mut diagnostics = DiagnosticCollector::new();
    let forms = ContractBuilder::new().build_forms(&object, &[form], &mut diagnostics);
    assert!(diagnostics.is_empty());

    let bound: Vec<_> = forms[0]
        .controls
        .iter()
        .filter_map(|c| c.binding.as_deref())
        .collect();
    // в отчете нет ни Наименования, ни табличной части
    assert!(bound.is_empty());
}

#[test]
fn regeneration_is_byte_identical() {
    let render = || {
        let object = XmlObjectParser::default()
            .parse_str(CATALOG_XML, Path::new("Catalogs/Контрагенты.xml"))
            .unwrap()
            .object;
        let form = XmlFormParser::default()
            .parse_str(ITEM_FORM_XML, "ФормаЭлемента", Path::new("Form.xml"))
            .unwrap()
            .form;
        let builder = ContractBuilder::new();
        let mut diagnostics = DiagnosticCollector::new();
        let object_json = to_json(&builder.build_object(&object, &mut diagnostics), true).unwrap();
        let forms_json: Vec<String> = builder
            .build_forms(&object, &[form], &mut diagnostics)
            .iter()
            .map(|f| to_json(f, true).unwrap())
            .collect();
        (object_json, forms_json)
    };

    assert_eq!(render(), render());
}

#[test]
fn scenario_type_tokens() {
    let normalizer = TypeNormalizer::new();
    assert_eq!(normalizer.normalize("cfg:CatalogRef.Контрагенты"), "СправочникСсылка.Контрагенты");
    assert_eq!(normalizer.normalize("xs:boolean"), "Булево");
    assert_eq!(normalizer.normalize("cfg:SomeNewKind"), "SomeNewKind");
}
