#![forbid(unsafe_code)]

//! # mdf4-model
//!
//! Reads, builds and writes ASAM MDF 4 measurement files as an in-memory
//! block graph.
//!
//! A file is parsed into an [`Mdf`] model: the identification and header
//! blocks, the file history, and one [`Group`] per data group holding its
//! channel group, channels, conversions, sources, texts and the
//! concatenated record payload. Channels are materialized on demand with
//! [`Mdf::get`], which decodes the packed records and applies the channel's
//! conversion. New groups are built from typed sample arrays with
//! [`Mdf::append`], and [`Mdf::save`] serializes the whole model in one
//! forward pass.
//!
//! ## Features
//!
//! - **Reading**: `##DT`, `##DZ`, `##DL` and `##HL` payloads, record ids and
//!   invalidation bytes, bit fields, integers, floats, strings and byte arrays
//! - **Conversions**: all eleven conversion kinds, from identity to
//!   text-to-text translation
//! - **Writing**: 8-byte aligned blocks, deduplicated texts, optional deflate
//!   compression
//!
//! ## Quick Start
//!
//! ```no_run
//! use mdf4_model::{Mdf, Result, Signal};
//!
//! fn main() -> Result<()> {
//!     let mut mdf = Mdf::open("recording.mf4")?;
//!
//!     let speed = Signal::new("speed", vec![10.0, 12.5, 15.0], vec![0.0, 0.1, 0.2])
//!         .with_unit("km/h");
//!     mdf.append(vec![speed], "bench")?;
//!
//!     let signal = mdf.get("speed", None)?;
//!     println!("{} samples in {}", signal.len(), signal.unit);
//!
//!     mdf.save(None)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`blocks`] | Block structures and the conversion engine |
//! | [`parsing`] | Byte range readers, record layout and the file reader |
//! | [`writer`] | Model serialization with [`MdfWriter`] |
//! | [`config`] | [`MdfConfig`] settings |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`] facade: `debug!` while walking and
//! writing groups, `warn!` for tolerated anomalies, `info!` once per saved
//! file.

pub mod blocks;
pub mod config;
pub mod error;
pub mod parsing;
pub mod writer;

mod group;
mod info;
mod mdf;
mod resample;
mod signal;
mod text_store;

pub use blocks::{
    ChannelConversion, ChannelType, ConversionKind, DataType, FormulaEvaluator,
    SimpleFormulaEvaluator,
};
pub use config::{Compression, MdfConfig};
pub use error::{Error, ErrorKind, Result};
pub use group::{ChannelTexts, Group, SourceInformation};
pub use info::{ChannelInfo, GroupInfo, MdfInfo};
pub use mdf::{ChannelSelector, GroupSelector, Mdf};
pub use parsing::{ByteRangeReader, FileRangeReader, RecordLayout, SliceRangeReader};
pub use resample::{LinearResampler, Resampler, linspace, union_timestamps};
pub use signal::{Samples, Signal};
pub use text_store::TextStore;
pub use writer::MdfWriter;
