/*!
# Contract Generator

Оркестратор генерации контрактов метаданных 1С.

Источники:
- текстовый отчет по конфигурации дает контракты объектов;
- XML выгрузка дает контракты объектов (если отчета нет) и контракты форм.

Формы связываются с тем же объектом, который попадает в контракт: при
наличии отчета это объект отчета того же вида и имени, и только если
в отчете его нет, используется объект из XML.

Каждый файл обрабатывается независимо: ошибка разбора одного объекта
или одной формы попадает в сводку и не останавливает остальные, если
не включен `fail_fast`. XML объекты разбираются параллельно (rayon),
порядок результатов совпадает с порядком обхода выгрузки.
*/

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::GeneratorSettings;
use crate::configuration::{
    ConfigurationDump, ConfigurationObject, FormDescriptor, KnownKind, ObjectKind, ObjectSource,
    ReportTreeParser, TypeNormalizer, XmlFormParser, XmlNamespaces, XmlObjectParser,
};
use crate::contracts::{ContractBuilder, FormContract};
use crate::core::{Diagnostic, DiagnosticCollector};
use crate::writer::ContractSink;

/// Фатальная ошибка одного файла
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Итог генерации
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub report_path: Option<PathBuf>,
    pub objects_parsed: usize,
    pub objects_written: usize,
    pub forms_written: usize,
    pub written_files: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationSummary {
    pub fn warnings(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Результат обработки одного XML объекта вместе с его формами
#[derive(Debug, Default)]
struct SourceOutcome {
    object: Option<ConfigurationObject>,
    forms: Vec<FormContract>,
    diagnostics: DiagnosticCollector,
    failures: Vec<FileFailure>,
}

pub struct ContractGenerator {
    settings: GeneratorSettings,
    namespaces: XmlNamespaces,
    normalizer: TypeNormalizer,
    builder: ContractBuilder,
    show_progress: bool,
}

impl ContractGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        let normalizer = settings.normalizer();
        Self {
            settings,
            namespaces: XmlNamespaces::default(),
            normalizer,
            builder: ContractBuilder::new(),
            show_progress: false,
        }
    }

    pub fn with_namespaces(mut self, namespaces: XmlNamespaces) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    fn object_parser(&self) -> XmlObjectParser {
        XmlObjectParser::new(self.namespaces.clone()).with_normalizer(self.normalizer.clone())
    }

    fn report_parser(&self) -> ReportTreeParser {
        ReportTreeParser::new()
            .with_indent_width(self.settings.indent_width)
            .with_normalizer(self.normalizer.clone())
    }

    fn resolve_report_path(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.settings.report_path {
            return Ok(Some(path.clone()));
        }
        match (&self.settings.conf_dir, self.settings.discover_report) {
            (Some(conf_dir), true) => Ok(ReportTreeParser::find_configuration_report(conf_dir)?),
            _ => Ok(None),
        }
    }

    /// Запускает генерацию и передает контракты в `sink`
    pub fn run(&self, sink: &mut dyn ContractSink) -> Result<GenerationSummary> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let settings = &self.settings;
        let mut diagnostics = DiagnosticCollector::new();
        let mut failures = Vec::new();
        let mut written_files = Vec::new();

        sink.prepare().context("Failed to prepare contract output")?;

        let report_path = self.resolve_report_path()?;
        let report_objects = match &report_path {
            Some(path) => {
                let parsed = self.report_parser().parse_file(path).with_context(|| {
                    format!("Failed to parse configuration report {}", path.display())
                })?;
                diagnostics.merge(parsed.diagnostics);
                Some(parsed.objects)
            }
            None => None,
        };

        let needs_xml =
            !settings.skip_forms || (report_objects.is_none() && !settings.skip_metadata);
        let outcomes = match (&settings.conf_dir, needs_xml) {
            (Some(conf_dir), true) => self.process_dump(conf_dir, report_objects.as_deref())?,
            (None, true) if report_objects.is_none() => {
                anyhow::bail!(
                    "Nothing to generate from: set a report path or a configuration directory"
                )
            }
            _ => Vec::new(),
        };

        let xml_objects: Vec<ConfigurationObject> =
            outcomes.iter().filter_map(|o| o.object.clone()).collect();
        let objects_parsed = report_objects.as_ref().map_or(xml_objects.len(), Vec::len);

        let mut objects_written = 0usize;
        if !settings.skip_metadata {
            let objects = report_objects.as_ref().unwrap_or(&xml_objects);
            for object in objects {
                let contract = self.builder.build_object(object, &mut diagnostics);
                written_files.push(sink.write_object(&contract)?);
                objects_written += 1;
            }
            tracing::info!("Wrote {} object contracts", objects_written);
        }

        let mut forms_written = 0usize;
        for outcome in outcomes {
            for form in &outcome.forms {
                written_files.push(sink.write_form(form)?);
                forms_written += 1;
            }
            diagnostics.merge(outcome.diagnostics);
            failures.extend(outcome.failures);
        }
        if !settings.skip_forms {
            tracing::info!("Wrote {} form contracts", forms_written);
        }

        tracing::info!(
            "Generation finished in {:.2?}: {} objects, {} forms, {} failures",
            timer.elapsed(),
            objects_written,
            forms_written,
            failures.len()
        );

        Ok(GenerationSummary {
            started_at,
            finished_at: Utc::now(),
            report_path,
            objects_parsed,
            objects_written,
            forms_written,
            written_files,
            failures,
            diagnostics: diagnostics.into_vec(),
        })
    }

    fn process_dump(
        &self,
        conf_dir: &Path,
        report_objects: Option<&[ConfigurationObject]>,
    ) -> Result<Vec<SourceOutcome>> {
        let dump = ConfigurationDump::discover(conf_dir)?;
        let progress = self.progress_bar(dump.objects.len() as u64);

        let outcomes = if self.settings.fail_fast {
            dump.objects
                .par_iter()
                .map(|source| {
                    let outcome = self.process_source(source, report_objects);
                    progress.inc(1);
                    match outcome.failures.first() {
                        Some(failure) => Err(anyhow::anyhow!(
                            "{}: {}",
                            failure.path.display(),
                            failure.error
                        )),
                        None => Ok(outcome),
                    }
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            dump.objects
                .par_iter()
                .map(|source| {
                    let outcome = self.process_source(source, report_objects);
                    progress.inc(1);
                    outcome
                })
                .collect::<Vec<_>>()
        };

        progress.finish_and_clear();
        Ok(outcomes)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        let template = "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_message("Разбор выгрузки");
        pb
    }

    fn process_source(
        &self,
        source: &ObjectSource,
        report_objects: Option<&[ConfigurationObject]>,
    ) -> SourceOutcome {
        let mut outcome = SourceOutcome::default();

        let parsed = match self.object_parser().parse_file(&source.xml_path) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Skipping object {}: {}", source.xml_path.display(), e);
                outcome.failures.push(FileFailure {
                    path: source.xml_path.clone(),
                    error: e.to_string(),
                });
                return outcome;
            }
        };
        outcome.diagnostics.merge(parsed.diagnostics);
        let object = parsed.object;

        if !self.settings.skip_forms {
            let bound = report_objects
                .and_then(|objects| {
                    objects
                        .iter()
                        .find(|o| o.kind == object.kind && o.name == object.name)
                })
                .unwrap_or(&object);
            let forms = self.build_forms(bound, source, &mut outcome);
            outcome.forms = forms;
        }
        outcome.object = Some(object);
        outcome
    }

    fn build_forms(
        &self,
        object: &ConfigurationObject,
        source: &ObjectSource,
        outcome: &mut SourceOutcome,
    ) -> Vec<FormContract> {
        let mut declared = object.clone();
        if declared.kind == ObjectKind::Known(KnownKind::CommonForm) && declared.forms.is_empty() {
            declared.forms.push(declared.name.clone());
        }

        let form_parser =
            XmlFormParser::new(self.namespaces.clone()).with_normalizer(self.normalizer.clone());
        let mut descriptors: Vec<FormDescriptor> = Vec::new();
        let mut broken: Vec<String> = Vec::new();
        for form_name in &declared.forms {
            let Some(form_source) = source.form(form_name) else {
                continue;
            };
            match form_parser.parse_file(&form_source.path, form_name) {
                Ok(parsed) => {
                    outcome.diagnostics.merge(parsed.diagnostics);
                    descriptors.push(parsed.form);
                }
                Err(e) => {
                    tracing::warn!("Skipping form {}: {}", form_source.path.display(), e);
                    outcome.failures.push(FileFailure {
                        path: form_source.path.clone(),
                        error: e.to_string(),
                    });
                    broken.push(form_name.clone());
                }
            }
        }

        // Битая форма уже в списке ошибок, как неразрешенная ссылка она не нужна
        declared.forms.retain(|name| !broken.contains(name));
        let mut diagnostics = DiagnosticCollector::new();
        let forms = self.builder.build_forms(&declared, &descriptors, &mut diagnostics);
        diagnostics.attach_path(&source.xml_path);
        outcome.diagnostics.merge(diagnostics);
        forms
    }
}
