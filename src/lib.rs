/*!
# 1C Metadata Contract Generator

Генерирует JSON контракты метаданных и форм конфигурации 1С:Предприятие
из текстового отчета по конфигурации и XML выгрузки.

## Architecture

```text
onec_contract_generator
├── Core            - Ошибки, диагностики, чтение файлов в разных кодировках
├── Configuration   - Разбор отчета, XML объектов и форм, нормализация типов
├── Contracts       - Модель контрактов, сборка, поисковые метаданные
├── Config          - Настройки генерации (TOML/YAML)
├── Writer          - Запись контрактов в каталог результата
└── Generator       - Оркестрация: обход выгрузки, параллельный разбор, сводка
```

## Usage

```bash
onec-contracts generate --report-path report.txt --conf-dir conf_files --output-dir metadata_contracts
onec-contracts normalize-type "cfg:CatalogRef.Контрагенты" "xs:decimal"
```

```rust,no_run
use onec_contract_generator::{ContractGenerator, FsContractSink, GeneratorSettings};

let settings = GeneratorSettings {
    conf_dir: Some("conf_files".into()),
    ..GeneratorSettings::default()
};
let mut sink = FsContractSink::new(&settings.output_dir);
let summary = ContractGenerator::new(settings).run(&mut sink)?;
println!("{} object contracts", summary.objects_written);
# Ok::<(), anyhow::Error>(())
```
*/

pub mod cli_common;
pub mod config;
pub mod configuration;
pub mod contract_generator;
pub mod contracts;
pub mod core;
pub mod writer;

pub use config::GeneratorSettings;
pub use configuration::{
    ConfigurationDump, ConfigurationObject, ReportTreeParser, TypeNormalizer, XmlFormParser,
    XmlObjectParser,
};
pub use contract_generator::{ContractGenerator, FileFailure, GenerationSummary};
pub use contracts::{ContractBuilder, FormContract, ObjectContract, SearchMetadataEnricher};
pub use core::{ContractError, ContractResult, Diagnostic, DiagnosticCollector, DiagnosticKind};
pub use writer::{ContractSink, FsContractSink, MemoryContractSink};

/// Версия библиотеки
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
