//! Rendering of a [`Manifest`] as Message Compiler (`.mc`) source.
//!
//! The output is a sequence of independent blocks. Everything that is not a message
//! definition is C scaffolding commented out with a leading `;`, which the message compiler
//! copies verbatim into the generated header.

use crate::err::{ConvertError, Result};
use crate::model::manifest::{EventDefinition, Manifest};

use log::debug;
use std::fmt::{self, Write};
use std::fs::File;
use std::io::{BufWriter, Write as IoWrite};
use std::path::Path;

/// Rendered in place of an attribute the manifest does not set.
pub const NONE_TOKEN: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McBlock {
    Header,
    ProviderInfo,
    Events,
    EventDescriptors,
    ProviderHandle,
    Registration,
    WriteMacros,
    WriteFunctions,
}

impl McBlock {
    /// Blocks in the order they appear in the output.
    pub const ALL: [McBlock; 8] = [
        McBlock::Header,
        McBlock::ProviderInfo,
        McBlock::Events,
        McBlock::EventDescriptors,
        McBlock::ProviderHandle,
        McBlock::Registration,
        McBlock::WriteMacros,
        McBlock::WriteFunctions,
    ];
}

pub struct McOutput<'a> {
    manifest: &'a Manifest,
    /// Provider name as a C identifier, used in handle and function names.
    func_name: String,
}

fn or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NONE_TOKEN)
}

impl<'a> McOutput<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        McOutput {
            manifest,
            func_name: manifest.provider.function_name(),
        }
    }

    /// Renders every block, in order.
    pub fn render<W: Write>(&self, out: &mut W) -> fmt::Result {
        for block in McBlock::ALL {
            self.render_block(block, out)?;
        }
        Ok(())
    }

    pub fn render_block<W: Write>(&self, block: McBlock, out: &mut W) -> fmt::Result {
        match block {
            McBlock::Header => out.write_str("MessageIdTypedef=DWORD\n\n"),
            McBlock::ProviderInfo => self.visit_provider_info(out),
            McBlock::Events => self.visit_events(out),
            McBlock::EventDescriptors => self.visit_event_descriptors(out),
            McBlock::ProviderHandle => self.visit_provider_handle(out),
            McBlock::Registration => self.visit_registration(out),
            McBlock::WriteMacros => self.visit_write_macros(out),
            McBlock::WriteFunctions => self.visit_write_functions(out),
        }
    }

    fn visit_provider_info<W: Write>(&self, out: &mut W) -> fmt::Result {
        let provider = &self.manifest.provider;

        writeln!(out, ";// Provider Information")?;
        writeln!(out, ";// Name: {}", provider.name)?;
        writeln!(out, ";// GUID: {}", provider.guid_text)?;
        writeln!(out, ";// Symbol: {}", or_none(&provider.symbol))?;
        writeln!(out)
    }

    fn visit_events<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, ";// Events")?;

        for event in &self.manifest.events {
            self.visit_event(event, out)?;
        }

        Ok(())
    }

    fn visit_event<W: Write>(&self, event: &EventDefinition, out: &mut W) -> fmt::Result {
        let body = event
            .resolve_message(&self.manifest.strings)
            .unwrap_or(NONE_TOKEN);

        writeln!(out, "MessageId={}", or_none(&event.value))?;
        writeln!(out, "SymbolicName={}", or_none(&event.symbol))?;
        writeln!(out, "Language=English")?;
        writeln!(out, "{}", body)?;
        writeln!(out, ".")?;
        writeln!(out)?;

        writeln!(out, ";// Channel: {}", or_none(&event.channel))?;
        writeln!(out, ";// Level: {}", or_none(&event.level))?;
        writeln!(out, ";// Task: {}", or_none(&event.task))?;
        writeln!(out, ";// Template: {}", or_none(&event.template))?;
        writeln!(out)
    }

    fn visit_event_descriptors<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, ";// Event Descriptors")?;

        for event in &self.manifest.events {
            writeln!(
                out,
                ";static const EVENT_DESCRIPTOR EventDesc_{} = {{ {}, 1, 0, 0, 0, 0, 0 }};",
                or_none(&event.symbol),
                or_none(&event.value)
            )?;
        }

        writeln!(out)
    }

    fn visit_provider_handle<W: Write>(&self, out: &mut W) -> fmt::Result {
        let provider = &self.manifest.provider;

        writeln!(out, ";// Provider Handle and GUID")?;
        writeln!(out, ";static REGHANDLE {}Handle = 0;", self.func_name)?;
        writeln!(out, ";static const GUID {} =", or_none(&provider.symbol))?;
        writeln!(out, ";{};", provider.guid.c_initializer())?;
        writeln!(out)
    }

    fn visit_registration<W: Write>(&self, out: &mut W) -> fmt::Result {
        let func = &self.func_name;
        let symbol = or_none(&self.manifest.provider.symbol);

        writeln!(out, ";// Provider Registration and Unregistration")?;
        writeln!(out, ";static inline ULONG EventRegister{}() {{", func)?;
        writeln!(
            out,
            ";    return EventRegister(&{}, nullptr, nullptr, &{}Handle);",
            symbol, func
        )?;
        writeln!(out, ";}}")?;
        writeln!(out)?;

        writeln!(out, ";static inline ULONG EventUnregister{}() {{", func)?;
        writeln!(out, ";    return EventUnregister({}Handle);", func)?;
        writeln!(out, ";}}")?;
        writeln!(out)
    }

    fn visit_write_macros<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, ";// Event Writing Functions")?;
        writeln!(
            out,
            ";#define GENERATE_EVENT_WRITE_FUNCTION(event_name, event_descriptor) \\"
        )?;
        writeln!(out, ";    static inline ULONG event_name(PCWSTR message) {{ \\")?;
        writeln!(out, ";        EVENT_DATA_DESCRIPTOR descriptor; \\")?;
        writeln!(
            out,
            ";        EventDataDescCreate(&descriptor, message, (ULONG)((wcslen(message) + 1) * sizeof(WCHAR))); \\"
        )?;
        writeln!(
            out,
            ";        return EventWrite({}Handle, &event_descriptor, 1, &descriptor); \\",
            self.func_name
        )?;
        writeln!(out, ";    }}")?;
        writeln!(out)?;

        writeln!(out, ";// AssumeEnabled Macros")?;
        writeln!(out, ";#define GENERATE_ASSUME_ENABLED_MACRO(event_name) \\")?;
        writeln!(
            out,
            ";    static inline ULONG event_name##_AssumeEnabled(PCWSTR message) {{ \\"
        )?;
        writeln!(out, ";        return event_name(message); \\")?;
        writeln!(out, ";    }}")?;
        writeln!(out)
    }

    fn visit_write_functions<W: Write>(&self, out: &mut W) -> fmt::Result {
        for event in &self.manifest.events {
            let symbol = or_none(&event.symbol);

            writeln!(
                out,
                ";GENERATE_EVENT_WRITE_FUNCTION(EventWrite{}, EventDesc_{})",
                symbol, symbol
            )?;
            writeln!(out, ";GENERATE_ASSUME_ENABLED_MACRO(EventWrite{})", symbol)?;
            writeln!(out)?;
        }

        Ok(())
    }
}

impl fmt::Display for McOutput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.render(f)
    }
}

/// Renders the whole `.mc` source for `manifest`.
pub fn render_mc(manifest: &Manifest) -> String {
    McOutput::new(manifest).to_string()
}

/// Writes rendered `.mc` text to `path`, creating or truncating the file.
pub fn write_mc(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();
    let map_err = |source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(map_err)?);
    writer.write_all(contents.as_bytes()).map_err(map_err)?;
    writer.flush().map_err(map_err)?;

    debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guid::Guid;
    use crate::model::manifest::Provider;
    use crate::string_table::StringTable;
    use pretty_assertions::assert_eq;

    fn manifest(events: Vec<EventDefinition>, strings: StringTable) -> Manifest {
        Manifest {
            provider: Provider {
                name: "My-Provider".to_owned(),
                guid_text: "{12345678-1234-5678-9ABC-DEF012345678}".to_owned(),
                guid: Guid::parse("{12345678-1234-5678-9ABC-DEF012345678}").unwrap(),
                symbol: Some("MY_PROVIDER".to_owned()),
            },
            events,
            strings,
        }
    }

    fn event(value: &str, symbol: &str, message: &str) -> EventDefinition {
        EventDefinition {
            value: Some(value.to_owned()),
            symbol: Some(symbol.to_owned()),
            message: Some(message.to_owned()),
            ..Default::default()
        }
    }

    fn block(manifest: &Manifest, block: McBlock) -> String {
        let mut out = String::new();
        McOutput::new(manifest).render_block(block, &mut out).unwrap();
        out
    }

    #[test]
    fn test_event_stanza_with_resolved_string() {
        let mut strings = StringTable::default();
        strings.insert("Event.Foo", "Hello");
        let mut foo = event("1", "Foo", "$(string.Event.Foo)");
        foo.channel = Some("Application".to_owned());

        let m = manifest(vec![foo], strings);

        assert_eq!(
            block(&m, McBlock::Events),
            ";// Events\n\
             MessageId=1\n\
             SymbolicName=Foo\n\
             Language=English\n\
             Hello\n\
             .\n\
             \n\
             ;// Channel: Application\n\
             ;// Level: None\n\
             ;// Task: None\n\
             ;// Template: None\n\
             \n"
        );
    }

    #[test]
    fn test_unresolved_string_renders_empty_body() {
        let m = manifest(
            vec![event("7", "Gone", "$(string.Event.Gone)")],
            StringTable::default(),
        );

        assert!(block(&m, McBlock::Events).contains("Language=English\n\n.\n"));
    }

    #[test]
    fn test_stanzas_follow_document_order() {
        let events = (1..=5)
            .map(|i| event(&i.to_string(), &format!("E{}", i), "text"))
            .collect();
        let m = manifest(events, StringTable::default());
        let rendered = render_mc(&m);

        let ids: Vec<_> = rendered
            .lines()
            .filter_map(|l| l.strip_prefix("MessageId="))
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_handle_and_guid_block() {
        let m = manifest(vec![], StringTable::default());

        assert_eq!(
            block(&m, McBlock::ProviderHandle),
            ";// Provider Handle and GUID\n\
             ;static REGHANDLE My_ProviderHandle = 0;\n\
             ;static const GUID MY_PROVIDER =\n\
             ;{ 0x12345678, 0x1234, 0x5678, { 0x9A, 0xBC, 0xDE, 0xF0, 0x12, 0x34, 0x56, 0x78 } };\n\
             \n"
        );
    }

    #[test]
    fn test_descriptors_and_write_functions_per_event() {
        let m = manifest(
            vec![event("10", "Start", "a"), event("11", "Stop", "b")],
            StringTable::default(),
        );

        assert_eq!(
            block(&m, McBlock::EventDescriptors),
            ";// Event Descriptors\n\
             ;static const EVENT_DESCRIPTOR EventDesc_Start = { 10, 1, 0, 0, 0, 0, 0 };\n\
             ;static const EVENT_DESCRIPTOR EventDesc_Stop = { 11, 1, 0, 0, 0, 0, 0 };\n\
             \n"
        );
        assert_eq!(
            block(&m, McBlock::WriteFunctions),
            ";GENERATE_EVENT_WRITE_FUNCTION(EventWriteStart, EventDesc_Start)\n\
             ;GENERATE_ASSUME_ENABLED_MACRO(EventWriteStart)\n\
             \n\
             ;GENERATE_EVENT_WRITE_FUNCTION(EventWriteStop, EventDesc_Stop)\n\
             ;GENERATE_ASSUME_ENABLED_MACRO(EventWriteStop)\n\
             \n"
        );
    }

    #[test]
    fn test_missing_attributes_render_none() {
        let mut m = manifest(vec![EventDefinition::default()], StringTable::default());
        m.provider.symbol = None;

        let rendered = render_mc(&m);
        assert!(rendered.contains(";// Symbol: None\n"));
        assert!(rendered.contains("MessageId=None\nSymbolicName=None\nLanguage=English\nNone\n.\n"));
        assert!(rendered.contains(";static const GUID None =\n"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let mut strings = StringTable::default();
        strings.insert("Event.A", "a");
        strings.insert("Event.B", "b");
        let m = manifest(
            vec![
                event("1", "A", "$(string.Event.A)"),
                event("2", "B", "$(string.Event.B)"),
            ],
            strings,
        );

        assert_eq!(render_mc(&m), render_mc(&m));
        assert!(render_mc(&m).starts_with("MessageIdTypedef=DWORD\n\n;// Provider Information\n"));
    }

    #[test]
    fn test_write_mc_reports_write_errors() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            write_mc(dir.path(), "x"),
            Err(ConvertError::Write { .. })
        ));

        let target = dir.path().join("out.mc");
        std::fs::write(&target, "previous, longer content").unwrap();
        write_mc(&target, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");
    }
}
