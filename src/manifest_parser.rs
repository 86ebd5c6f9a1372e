use crate::err::{ConvertError, Result};
use crate::guid::Guid;
use crate::model::manifest::{EventDefinition, Manifest, MessageSource, Provider};
use crate::model::xml::XmlElement;
use crate::namespaces::ManifestNamespaces;
use crate::string_table::StringTable;

use log::{debug, warn};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Input paths must end with this suffix (case-sensitive; a file named just `.man` qualifies).
pub const MANIFEST_SUFFIX: &str = ".man";

/// Reads instrumentation manifests (`.man`) into a [`Manifest`].
#[derive(Debug, Clone, Default)]
pub struct ManifestParser {
    namespaces: ManifestNamespaces,
}

impl ManifestParser {
    pub fn new() -> Self {
        ManifestParser::default()
    }

    pub fn with_namespaces(mut self, namespaces: ManifestNamespaces) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn namespaces(&self) -> &ManifestNamespaces {
        &self.namespaces
    }

    /// Opens, parses and extracts the manifest at `path`, which must end with `.man`.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Manifest> {
        let path = path.as_ref();

        if !path.to_string_lossy().ends_with(MANIFEST_SUFFIX) {
            return Err(ConvertError::InvalidExtension {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConvertError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ConvertError::FailedToReadInput {
                path: path.to_path_buf(),
                source,
            },
        })?;

        debug!("parsing manifest {}", path.display());

        let root = XmlElement::from_reader(BufReader::new(file)).map_err(|source| {
            ConvertError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;

        self.extract(&root)
    }

    /// Extracts the provider, its events and the string table from a parsed document.
    pub fn extract(&self, root: &XmlElement) -> Result<Manifest> {
        let ns = &self.namespaces;

        if !root
            .namespace
            .as_deref()
            .is_some_and(|uri| ns.is_known(uri))
        {
            warn!(
                "root element <{}> is not in any of the manifest namespaces ({:?})",
                root.name, root.namespace
            );
        }

        let provider_element = root
            .descendant(&ns.events, "provider")
            .ok_or(ConvertError::MissingElement {
                element: "provider",
            })?;

        let provider = read_provider(provider_element)?;

        let events: Vec<EventDefinition> = provider_element
            .child(&ns.events, "events")
            .ok_or(ConvertError::MissingElement { element: "events" })?
            .children_named(&ns.events, "event")
            .map(read_event)
            .collect();

        let strings = StringTable::populate(
            root.descendant(&ns.events, "stringTable")
                .ok_or(ConvertError::MissingElement {
                    element: "stringTable",
                })?,
            ns,
        );

        debug!(
            "provider `{}` has {} events, string table has {} entries",
            provider.name,
            events.len(),
            strings.len()
        );

        for event in &events {
            if let Some(MessageSource::StringRef(suffix)) = event.message_source() {
                if strings.get(&format!("Event.{}", suffix)).is_none() {
                    warn!(
                        "event {:?} refers to string `Event.{}`, which is not in the string table",
                        event.symbol, suffix
                    );
                }
            }
        }

        Ok(Manifest {
            provider,
            events,
            strings,
        })
    }
}

fn read_provider(element: &XmlElement) -> Result<Provider> {
    let name = element
        .attribute("name")
        .ok_or(ConvertError::MissingAttribute {
            element: "provider",
            attribute: "name",
        })?;

    let guid_text = element
        .attribute("guid")
        .ok_or(ConvertError::MissingAttribute {
            element: "provider",
            attribute: "guid",
        })?;

    Ok(Provider {
        name: name.to_owned(),
        guid_text: guid_text.to_owned(),
        guid: Guid::parse(guid_text)?,
        symbol: element.attribute("symbol").map(str::to_owned),
    })
}

fn read_event(element: &XmlElement) -> EventDefinition {
    let attr = |name: &str| element.attribute(name).map(str::to_owned);

    EventDefinition {
        value: attr("value"),
        symbol: attr("symbol"),
        message: attr("message"),
        channel: attr("channel"),
        level: attr("level"),
        task: attr("task"),
        template: attr("template"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(xml: &str) -> Result<Manifest> {
        let root = XmlElement::parse_str(xml).unwrap();
        ManifestParser::new().extract(&root)
    }

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<instrumentationManifest xmlns="http://schemas.microsoft.com/win/2004/08/events"
    xmlns:win="http://manifests.microsoft.com/win/2004/08/windows/events"
    xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <instrumentation>
    <events>
      <provider name="My-Provider" guid="{12345678-1234-5678-9ABC-DEF012345678}" symbol="MY_PROVIDER">
        <events>
          <event value="1" symbol="First" message="$(string.Event.First)" level="win:Informational"/>
          <event value="2" symbol="Second" message="literal"/>
        </events>
      </provider>
    </events>
  </instrumentation>
  <localization>
    <resources culture="en-US">
      <stringTable>
        <string id="Event.First" value="First event"/>
      </stringTable>
    </resources>
  </localization>
</instrumentationManifest>"#;

    #[test]
    fn test_extracts_provider_events_and_strings() {
        let manifest = extract(MANIFEST).unwrap();

        assert_eq!(manifest.provider.name, "My-Provider");
        assert_eq!(manifest.provider.symbol.as_deref(), Some("MY_PROVIDER"));
        assert_eq!(
            manifest.provider.guid_text,
            "{12345678-1234-5678-9ABC-DEF012345678}"
        );

        let symbols: Vec<_> = manifest
            .events
            .iter()
            .map(|e| e.symbol.as_deref().unwrap())
            .collect();
        assert_eq!(symbols, vec!["First", "Second"]);
        assert_eq!(manifest.events[0].level.as_deref(), Some("win:Informational"));
        assert_eq!(manifest.events[1].channel, None);
        assert_eq!(manifest.strings.get("Event.First"), Some("First event"));
    }

    #[test]
    fn test_missing_containers_are_typed_errors() {
        let no_provider = r#"<instrumentationManifest xmlns="http://schemas.microsoft.com/win/2004/08/events"/>"#;
        assert!(matches!(
            extract(no_provider),
            Err(ConvertError::MissingElement { element: "provider" })
        ));

        let no_events = MANIFEST
            .replace("<events>\n          <event", "<nope>\n          <event")
            .replace("</events>\n      </provider>", "</nope>\n      </provider>");
        assert!(matches!(
            extract(&no_events),
            Err(ConvertError::MissingElement { element: "events" })
        ));

        let no_strings = MANIFEST
            .replace("<stringTable>", "<strings>")
            .replace("</stringTable>", "</strings>");
        assert!(matches!(
            extract(&no_strings),
            Err(ConvertError::MissingElement {
                element: "stringTable"
            })
        ));
    }

    #[test]
    fn test_provider_in_wrong_namespace_is_not_found() {
        let parser = ManifestParser::new().with_namespaces(
            ManifestNamespaces::default().events("urn:somewhere-else"),
        );
        let root = XmlElement::parse_str(MANIFEST).unwrap();

        assert!(matches!(
            parser.extract(&root),
            Err(ConvertError::MissingElement { element: "provider" })
        ));
    }

    #[test]
    fn test_provider_attributes_are_validated() {
        let no_guid = MANIFEST.replace(r#"guid="{12345678-1234-5678-9ABC-DEF012345678}""#, "");
        assert!(matches!(
            extract(&no_guid),
            Err(ConvertError::MissingAttribute {
                attribute: "guid",
                ..
            })
        ));

        let bad_guid = MANIFEST.replace("9ABC-DEF0", "9ABC-XYZ0");
        assert!(matches!(
            extract(&bad_guid),
            Err(ConvertError::InvalidGuid { .. })
        ));
    }

    #[test]
    fn test_parse_file_error_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let parser = ManifestParser::new();

        assert!(matches!(
            parser.parse_file(dir.path().join("input.xml")),
            Err(ConvertError::InvalidExtension { .. })
        ));
        assert!(matches!(
            parser.parse_file(dir.path().join("input.MAN")),
            Err(ConvertError::InvalidExtension { .. })
        ));
        assert!(matches!(
            parser.parse_file(dir.path().join("missing.man")),
            Err(ConvertError::NotFound { .. })
        ));

        let malformed = dir.path().join("malformed.man");
        std::fs::write(&malformed, "<instrumentationManifest><events></instrumentationManifest>")
            .unwrap();
        assert!(matches!(
            parser.parse_file(&malformed),
            Err(ConvertError::Parse { .. })
        ));

        let good = dir.path().join("good.man");
        std::fs::write(&good, MANIFEST).unwrap();
        assert_eq!(parser.parse_file(&good).unwrap().events.len(), 2);

        let bare_suffix = dir.path().join(".man");
        std::fs::write(&bare_suffix, MANIFEST).unwrap();
        assert_eq!(parser.parse_file(&bare_suffix).unwrap().events.len(), 2);
    }
}
