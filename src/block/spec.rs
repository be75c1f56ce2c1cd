//! Block identity value type

use std::fmt;
use std::str::FromStr;

use crate::core::error::Error;

/// Block identity: a type id plus a variant/data value.
///
/// The canonical string form is `"id:data"`; a bare `"id"` parses with data 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockSpec {
    /// Block type id
    pub id: u16,
    /// Variant/data value
    pub data: u8,
}

impl BlockSpec {
    /// Empty/air block
    pub const AIR: BlockSpec = BlockSpec { id: 0, data: 0 };

    /// Ladder block type (any data value)
    pub const LADDER: BlockSpec = BlockSpec { id: 65, data: 0 };

    pub const fn new(id: u16, data: u8) -> Self {
        Self { id, data }
    }

    /// Create a block with data 0
    pub const fn of(id: u16) -> Self {
        Self { id, data: 0 }
    }

    /// Check if block is empty (air)
    pub fn is_empty(&self) -> bool {
        self.id == 0
    }

    /// Check if two blocks share a type id, ignoring data
    pub fn same_type(&self, other: &BlockSpec) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for BlockSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.data)
    }
}

impl FromStr for BlockSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidBlock(s.to_string());
        let (id, data) = match s.trim().split_once(':') {
            Some((id, data)) => (id, data),
            None => (s.trim(), "0"),
        };
        let id = id.trim().parse::<u16>().map_err(|_| invalid())?;
        let data = data.trim().parse::<u8>().map_err(|_| invalid())?;
        Ok(Self { id, data })
    }
}

impl serde::Serialize for BlockSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for BlockSpec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
