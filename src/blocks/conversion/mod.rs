mod base;
mod formula;
mod kind;
mod linear;
pub(crate) mod table_lookup;
mod text;
mod types;

pub use base::{CC_FLAG_PHYSICAL_RANGE, ConversionBlock};
pub use formula::{FormulaEvaluator, SimpleFormulaEvaluator};
pub use kind::{ChannelConversion, ConversionKind};
pub use types::ConversionType;
