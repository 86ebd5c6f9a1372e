use crate::model::xml::XmlTreeError;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Input file `{}` must have a .man extension.", path.display())]
    InvalidExtension { path: PathBuf },

    #[error("File `{}` not found.", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read `{}`: {source}", path.display())]
    FailedToReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse the XML file `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: XmlTreeError,
    },

    #[error("Could not find the <{element}> element in the XML.")]
    MissingElement { element: &'static str },

    #[error("The <{element}> element is missing its `{attribute}` attribute.")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Provider GUID `{guid}` is malformed: {reason}")]
    InvalidGuid { guid: String, reason: &'static str },

    #[error("Failed to write to `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConvertError {
    /// Process exit code for this error. Every failure of the converter maps to `1`.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
