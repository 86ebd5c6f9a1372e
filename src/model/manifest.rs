use crate::guid::Guid;
use crate::string_table::StringTable;

/// Prefix of a message that refers to the string table instead of carrying literal text.
pub const EVENT_STRING_REF_PREFIX: &str = "$(string.Event.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub name: String,
    /// The `guid` attribute exactly as written in the manifest.
    pub guid_text: String,
    pub guid: Guid,
    pub symbol: Option<String>,
}

impl Provider {
    /// The provider name as a C identifier (`Pistache-Provider` -> `Pistache_Provider`).
    pub fn function_name(&self) -> String {
        self.name.replace('-', "_")
    }
}

/// An `<event>` element. Every attribute is kept as written; absent ones are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDefinition {
    pub value: Option<String>,
    pub symbol: Option<String>,
    pub message: Option<String>,
    pub channel: Option<String>,
    pub level: Option<String>,
    pub task: Option<String>,
    pub template: Option<String>,
}

/// How the text of an event message is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource<'a> {
    /// `$(string.Event.<suffix>)`, resolved through the string table entry `Event.<suffix>`.
    StringRef(&'a str),
    Literal(&'a str),
}

impl EventDefinition {
    pub fn message_source(&self) -> Option<MessageSource<'_>> {
        let message = self.message.as_deref()?;

        match message
            .strip_prefix(EVENT_STRING_REF_PREFIX)
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(suffix) => Some(MessageSource::StringRef(suffix)),
            None => Some(MessageSource::Literal(message)),
        }
    }

    /// The message body to emit, with string references resolved.
    ///
    /// A reference to an id missing from `strings` resolves to an empty string.
    /// `None` means the event has no `message` attribute at all.
    pub fn resolve_message<'a>(&'a self, strings: &'a StringTable) -> Option<&'a str> {
        match self.message_source()? {
            MessageSource::StringRef(suffix) => {
                Some(strings.get(&format!("Event.{}", suffix)).unwrap_or(""))
            }
            MessageSource::Literal(text) => Some(text),
        }
    }
}

/// Everything the `.mc` renderer needs from a manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub provider: Provider,
    pub events: Vec<EventDefinition>,
    pub strings: StringTable,
}
