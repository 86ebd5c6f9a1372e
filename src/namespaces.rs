/// Namespace of the `instrumentationManifest` schema (`provider`, `events`, `stringTable`, ...).
pub const EVENTS_NS: &str = "http://schemas.microsoft.com/win/2004/08/events";
/// Namespace of the Windows-specific event types (`win:UnicodeString`, `win:Informational`, ...).
pub const WINDOWS_EVENTS_NS: &str = "http://manifests.microsoft.com/win/2004/08/windows/events";
/// The XML schema namespace, used by manifests for `xs:` types.
pub const XML_SCHEMA_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// The namespace URIs every manifest lookup is qualified against.
///
/// This is passed explicitly to the parser instead of being read from globals,
/// so tests (or unusual manifests) can swap a URI without touching the lookup code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestNamespaces {
    /// Every element the converter looks up lives here.
    pub events: String,
    /// Only used to recognize the document as a manifest; see [`ManifestNamespaces::is_known`].
    pub windows_events: String,
    pub xml_schema: String,
}

impl ManifestNamespaces {
    pub fn new() -> Self {
        ManifestNamespaces {
            events: EVENTS_NS.to_owned(),
            windows_events: WINDOWS_EVENTS_NS.to_owned(),
            xml_schema: XML_SCHEMA_NS.to_owned(),
        }
    }

    /// Replaces the URI that `provider`, `events`, `event`, `stringTable` and `string`
    /// are looked up in.
    pub fn events(mut self, uri: impl Into<String>) -> Self {
        self.events = uri.into();
        self
    }

    /// Whether `uri` is one of the namespaces a manifest is expected to use.
    pub fn is_known(&self, uri: &str) -> bool {
        uri == self.events || uri == self.windows_events || uri == self.xml_schema
    }
}

impl Default for ManifestNamespaces {
    fn default() -> Self {
        ManifestNamespaces::new()
    }
}
