/*!
# Contracts

JSON контракты объектов и форм: модель записей, сборка из разобранных
объектов и поисковые метаданные.
*/

pub mod builder;
pub mod model;
pub mod search;

pub use builder::{binding_path, to_json, ContractBuilder, BINDING_ROOT};
pub use model::{
    CommandContract, ControlContract, FormContract, FormKind, ObjectContract, PropertyContract,
    SearchInfo, TabularSectionContract,
};
pub use search::{SearchMetadataEnricher, UNCATEGORIZED};
