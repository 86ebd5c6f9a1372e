#![deny(unused_must_use)]
#![forbid(unsafe_code)]

pub mod err;
pub mod guid;
pub mod manifest_parser;
pub mod mc_output;
pub mod model;
pub mod namespaces;
pub mod string_table;

pub use err::{ConvertError, Result};
pub use manifest_parser::ManifestParser;
pub use mc_output::{McBlock, McOutput, render_mc, write_mc};
pub use model::manifest::{EventDefinition, Manifest, Provider};
pub use namespaces::ManifestNamespaces;

use log::info;
use std::path::Path;

/// What a successful [`convert`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub provider: String,
    pub events: usize,
    pub bytes_written: usize,
}

/// Reads the manifest at `input`, renders it as `.mc` source and writes it to `output`.
pub fn convert(
    parser: &ManifestParser,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<ConversionSummary> {
    let manifest = parser.parse_file(input.as_ref())?;
    let contents = render_mc(&manifest);
    write_mc(output.as_ref(), &contents)?;

    info!(
        "converted {} events of provider `{}`",
        manifest.events.len(),
        manifest.provider.name
    );

    Ok(ConversionSummary {
        provider: manifest.provider.name,
        events: manifest.events.len(),
        bytes_written: contents.len(),
    })
}
