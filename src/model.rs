pub mod manifest;
pub mod xml;
