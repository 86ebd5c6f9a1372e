use crate::model::xml::XmlElement;
use crate::namespaces::ManifestNamespaces;

use hashbrown::HashMap as FastMap;
use log::{trace, warn};

/// Localized strings of a manifest, keyed by their `id` (e.g. `Event.ServerStarted`).
#[derive(Debug, Default, Clone)]
pub struct StringTable(FastMap<String, String>);

impl StringTable {
    /// Collects the `<string>` children of a `<stringTable>` element.
    ///
    /// Entries without an `id` are skipped, entries without a `value` map to an empty string.
    /// A repeated `id` overrides the earlier entry.
    pub fn populate(string_table: &XmlElement, namespaces: &ManifestNamespaces) -> Self {
        let mut table = FastMap::new();

        for string in string_table.children_named(&namespaces.events, "string") {
            let Some(id) = string.attribute("id") else {
                warn!("skipping a <string> entry without an `id` attribute");
                continue;
            };

            let value = match string.attribute("value") {
                Some(value) => value,
                None => {
                    warn!("string `{}` has no `value` attribute, using an empty string", id);
                    ""
                }
            };

            trace!("\tstring `{}` = {:?}", id, value);

            if table.insert(id.to_owned(), value.to_owned()).is_some() {
                warn!("string `{}` is defined more than once, keeping the last one", id);
            }
        }

        StringTable(table)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.0.insert(id.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
