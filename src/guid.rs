use crate::err::{ConvertError, Result};

use std::fmt::{self, Debug, Display};

/// Lengths (in hex digits) of the hyphen-separated groups of a textual GUID.
const GROUP_LENGTHS: [usize; 5] = [8, 4, 4, 4, 12];

/// A provider GUID as written in the manifest.
///
/// The digits are kept exactly as they appear in the source (case included), and are
/// sliced along the binary `GUID` layout: `Data1` (4 bytes), `Data2` (2), `Data3` (2)
/// and the eight `Data4` bytes carved out of the last two groups.
#[derive(PartialEq, Eq, Clone)]
pub struct Guid {
    /// 32 hex digits, braces and hyphens removed.
    hex: String,
}

impl Guid {
    /// Parses `{D1-D2-D3-D4-D5}`. The braces are optional.
    pub fn parse(text: &str) -> Result<Guid> {
        let invalid = |reason: &'static str| ConvertError::InvalidGuid {
            guid: text.to_owned(),
            reason,
        };

        let inner = text.strip_prefix('{').unwrap_or(text);
        let inner = inner.strip_suffix('}').unwrap_or(inner);

        let groups: Vec<&str> = inner.split('-').collect();
        if groups.len() != GROUP_LENGTHS.len() {
            return Err(invalid("expected five hyphen-separated groups"));
        }

        let mut hex = String::with_capacity(32);
        for (group, &len) in groups.iter().zip(GROUP_LENGTHS.iter()) {
            if group.len() != len {
                return Err(invalid("expected groups of 8-4-4-4-12 hex digits"));
            }
            if !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid("found a character that is not a hex digit"));
            }
            hex.push_str(group);
        }

        Ok(Guid { hex })
    }

    pub fn data1(&self) -> &str {
        &self.hex[0..8]
    }

    pub fn data2(&self) -> &str {
        &self.hex[8..12]
    }

    pub fn data3(&self) -> &str {
        &self.hex[12..16]
    }

    pub fn data4(&self) -> [&str; 8] {
        std::array::from_fn(|i| &self.hex[16 + 2 * i..18 + 2 * i])
    }

    /// The GUID as a C aggregate initializer,
    /// e.g. `{ 0x12345678, 0x1234, 0x5678, { 0x9A, 0xBC, 0xDE, 0xF0, 0x12, 0x34, 0x56, 0x78 } }`.
    pub fn c_initializer(&self) -> CInitializer<'_> {
        CInitializer(self)
    }
}

pub struct CInitializer<'a>(&'a Guid);

impl Display for CInitializer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let guid = self.0;
        write!(
            f,
            "{{ 0x{}, 0x{}, 0x{}, {{ ",
            guid.data1(),
            guid.data2(),
            guid.data3()
        )?;

        for (i, byte) in guid.data4().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "0x{}", byte)?;
        }

        f.write_str(" } }")
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.data1(),
            self.data2(),
            self.data3(),
            &self.hex[16..20],
            &self.hex[20..32]
        )
    }
}

impl Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
