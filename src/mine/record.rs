//! Flat persisted form of a mine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::BlockSpec;
use crate::core::error::Error;
use crate::core::types::{IVec3, Result};
use crate::mine::composition::Composition;
use crate::mine::state::MineState;
use crate::schedule::countdown::Countdown;
use crate::world::{WorldId, WorldResolver};

/// Composition as stored: ordered `[block, weight]` pairs, or a legacy object map
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredComposition {
    Pairs(Vec<(String, f64)>),
    Map(BTreeMap<String, f64>),
}

impl Default for StoredComposition {
    fn default() -> Self {
        StoredComposition::Pairs(Vec::new())
    }
}

/// Warning threshold as stored: numbers are written as strings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredWarning {
    Number(i64),
    Float(f64),
    Text(String),
}

fn no_teleport_y() -> i32 {
    -1
}

/// One mine as written to the store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MineRecord {
    pub min_x: i32,
    pub min_y: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_y: i32,
    pub max_z: i32,
    #[serde(alias = "worldName")]
    pub world: String,
    #[serde(default)]
    pub composition: StoredComposition,
    pub name: String,
    #[serde(default, alias = "resetDelayMinutes")]
    pub reset_delay: i64,
    #[serde(default)]
    pub reset_warnings: Vec<StoredWarning>,
    /// Empty string means no surface override
    #[serde(default)]
    pub surface: String,
    #[serde(default)]
    pub fill_mode: bool,
    #[serde(default)]
    pub reset_clock: i64,
    #[serde(default)]
    pub is_silent: bool,
    #[serde(default)]
    pub ignore_ladders: bool,
    #[serde(default)]
    pub tp_x: i32,
    /// Negative means no teleport point
    #[serde(default = "no_teleport_y")]
    pub tp_y: i32,
    #[serde(default)]
    pub tp_z: i32,
}

impl MineRecord {
    /// Decode a record from a JSON value
    pub fn decode(value: serde_json::Value) -> Result<Self> {
        let name = value
            .get("name")
            .and_then(|n| n.as_str())
            .unwrap_or("<unnamed>")
            .to_string();
        serde_json::from_value(value).map_err(|e| Error::MalformedRecord(format!("{}: {}", name, e)))
    }

    /// Flatten a mine for storage
    pub fn from_state(mine: &MineState) -> Self {
        let bounds = mine.bounds();
        let teleport = mine.teleport_point();
        Self {
            min_x: bounds.min.x,
            min_y: bounds.min.y,
            min_z: bounds.min.z,
            max_x: bounds.max.x,
            max_y: bounds.max.y,
            max_z: bounds.max.z,
            world: mine.world().to_string(),
            composition: StoredComposition::Pairs(
                mine.composition().iter().map(|(b, w)| (b.to_string(), w)).collect(),
            ),
            name: mine.name().to_string(),
            reset_delay: mine.reset_delay() as i64,
            reset_warnings: mine
                .reset_warnings()
                .iter()
                .map(|w| StoredWarning::Text(w.to_string()))
                .collect(),
            surface: mine.surface().map(|s| s.to_string()).unwrap_or_default(),
            fill_mode: mine.fill_mode(),
            reset_clock: mine.time_until_reset() as i64,
            is_silent: mine.is_silent(),
            ignore_ladders: mine.ignore_ladders(),
            tp_x: teleport.map(|p| p.x).unwrap_or(0),
            tp_y: teleport.map(|p| p.y).unwrap_or(-1),
            tp_z: teleport.map(|p| p.z).unwrap_or(0),
        }
    }

    /// Rebuild the mine, validating every field.
    ///
    /// The world must resolve now; a mine whose world is missing never comes online.
    pub fn into_state(self, worlds: &dyn WorldResolver) -> Result<MineState> {
        let world = WorldId::new(self.world.clone());
        if worlds.resolve(&world).is_none() {
            return Err(Error::UnknownWorld(self.world));
        }

        let composition = self.parse_composition()?;
        let warnings = self
            .reset_warnings
            .iter()
            .map(parse_warning)
            .collect::<Result<Vec<u32>>>()?;
        let reset_delay = u32::try_from(self.reset_delay).map_err(|_| {
            Error::MalformedRecord(format!("{}: negative reset delay {}", self.name, self.reset_delay))
        })?;
        let clock = u32::try_from(self.reset_clock).map_err(|_| {
            Error::MalformedRecord(format!("{}: negative reset clock {}", self.name, self.reset_clock))
        })?;
        let surface = match self.surface.trim() {
            "" => None,
            s => Some(s.parse::<BlockSpec>()?),
        };
        let teleport = (self.tp_y >= 0).then(|| IVec3::new(self.tp_x, self.tp_y, self.tp_z));

        let mut mine = MineState::new(
            self.name,
            world,
            IVec3::new(self.min_x, self.min_y, self.min_z),
            IVec3::new(self.max_x, self.max_y, self.max_z),
        );
        mine.set_composition(composition);
        mine.set_countdown(Countdown::restore(reset_delay, warnings, clock));
        mine.set_surface(surface);
        mine.set_fill_mode(self.fill_mode);
        mine.set_silent(self.is_silent);
        mine.set_ignore_ladders(self.ignore_ladders);
        mine.set_teleport_point(teleport)?;
        Ok(mine)
    }

    fn parse_composition(&self) -> Result<Composition> {
        let pairs: Vec<(&str, f64)> = match &self.composition {
            StoredComposition::Pairs(pairs) => pairs.iter().map(|(b, w)| (b.as_str(), *w)).collect(),
            StoredComposition::Map(map) => map.iter().map(|(b, w)| (b.as_str(), *w)).collect(),
        };

        let mut composition = Composition::new();
        for (block, weight) in pairs {
            let spec = block
                .parse::<BlockSpec>()
                .map_err(|_| Error::MalformedComposition(format!("{}: bad block '{}'", self.name, block)))?;
            composition
                .set(spec, weight)
                .map_err(|_| Error::MalformedComposition(format!("{}: bad weight {} for '{}'", self.name, weight, block)))?;
        }
        Ok(composition)
    }
}

fn parse_warning(warning: &StoredWarning) -> Result<u32> {
    match warning {
        StoredWarning::Number(n) => u32::try_from(*n).map_err(|_| Error::InvalidWarning(n.to_string())),
        StoredWarning::Float(f) => {
            if f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64 {
                Ok(*f as u32)
            } else {
                Err(Error::InvalidWarning(f.to_string()))
            }
        }
        StoredWarning::Text(s) => s.trim().parse::<u32>().map_err(|_| Error::InvalidWarning(s.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{MemoryWorld, MemoryWorlds};
    use serde_json::json;

    fn worlds() -> MemoryWorlds {
        let mut worlds = MemoryWorlds::new();
        worlds.insert("world", MemoryWorld::new());
        worlds
    }

    fn sample_json() -> serde_json::Value {
        json!({
            "minX": 0, "minY": 10, "minZ": 0,
            "maxX": 15, "maxY": 40, "maxZ": 15,
            "world": "world",
            "composition": [["1:0", 0.7], ["16:0", 0.2]],
            "name": "quarry",
            "resetDelay": 15,
            "resetWarnings": ["5", "1"],
            "surface": "",
            "fillMode": false,
            "resetClock": 7,
            "isSilent": false,
            "ignoreLadders": true,
            "tpX": 0, "tpY": -1, "tpZ": 0
        })
    }

    #[test]
    fn test_decode_full_record() {
        let record = MineRecord::decode(sample_json()).unwrap();
        let mine = record.into_state(&worlds()).unwrap();

        assert_eq!(mine.name(), "quarry");
        assert_eq!(mine.reset_delay(), 15);
        assert_eq!(mine.reset_warnings(), &[5, 1]);
        assert_eq!(mine.time_until_reset(), 7);
        assert!(mine.ignore_ladders());
        assert!(mine.surface().is_none());
        assert!(mine.teleport_point().is_none());
        assert_eq!(mine.composition().weight(&BlockSpec::of(16)), Some(0.2));
    }

    #[test]
    fn test_legacy_clock_migration() {
        let mut value = sample_json();
        value["resetClock"] = json!(0);
        let mine = MineRecord::decode(value).unwrap().into_state(&worlds()).unwrap();
        assert_eq!(mine.time_until_reset(), 15);
    }

    #[test]
    fn test_optional_keys_default() {
        let value = json!({
            "minX": 0, "minY": 0, "minZ": 0, "maxX": 1, "maxY": 1, "maxZ": 1,
            "worldName": "world",
            "composition": {"1": 0.5},
            "name": "old",
            "resetDelayMinutes": 0,
            "resetWarnings": []
        });
        let mine = MineRecord::decode(value).unwrap().into_state(&worlds()).unwrap();
        assert!(!mine.fill_mode());
        assert!(!mine.is_silent());
        assert!(mine.teleport_point().is_none());
        assert_eq!(mine.composition().weight(&BlockSpec::of(1)), Some(0.5));
    }

    #[test]
    fn test_configuration_errors() {
        let mut bad_world = sample_json();
        bad_world["world"] = json!("missing");
        let err = MineRecord::decode(bad_world).unwrap().into_state(&worlds()).unwrap_err();
        assert!(matches!(err, Error::UnknownWorld(ref w) if w == "missing"));

        let mut bad_warning = sample_json();
        bad_warning["resetWarnings"] = json!(["5", "soon"]);
        let err = MineRecord::decode(bad_warning).unwrap().into_state(&worlds()).unwrap_err();
        assert!(matches!(err, Error::InvalidWarning(_)));

        let mut bad_block = sample_json();
        bad_block["composition"] = json!([["diamond", 0.1]]);
        let err = MineRecord::decode(bad_block).unwrap().into_state(&worlds()).unwrap_err();
        assert!(matches!(err, Error::MalformedComposition(_)));

        let mut bad_weight = sample_json();
        bad_weight["composition"] = json!([["1:0", -0.5]]);
        let err = MineRecord::decode(bad_weight).unwrap().into_state(&worlds()).unwrap_err();
        assert!(err.is_configuration());

        let mut missing_bounds = sample_json();
        missing_bounds.as_object_mut().unwrap().remove("maxX");
        assert!(matches!(MineRecord::decode(missing_bounds), Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn test_round_trip() {
        let mut mine = MineState::new("pit", "world".into(), IVec3::new(4, 8, 4), IVec3::new(-4, 2, -4));
        mine.composition_mut().set(BlockSpec::of(1), 0.6).unwrap();
        mine.composition_mut().set(BlockSpec::new(1, 3), 0.3).unwrap();
        mine.composition_mut().set(BlockSpec::of(16), 0.9856906946328695).unwrap();
        mine.composition_mut().set(BlockSpec::of(15), 0.1 + 0.2).unwrap();
        mine.set_reset_delay(12);
        mine.set_reset_warnings(vec![3, 1, 1]);
        mine.tick();
        mine.set_surface(Some(BlockSpec::of(2)));
        mine.set_fill_mode(true);
        mine.set_silent(true);
        mine.set_teleport_point(Some(IVec3::new(0, 20, 9))).unwrap();

        let json = serde_json::to_string(&MineRecord::from_state(&mine)).unwrap();
        let record: MineRecord = serde_json::from_str(&json).unwrap();
        let restored = record.into_state(&worlds()).unwrap();

        assert_eq!(restored, mine);
        assert_eq!(restored.time_until_reset(), 11);
        assert_eq!(restored.composition().weight(&BlockSpec::of(16)), Some(0.9856906946328695));
    }

    #[test]
    fn test_weights_survive_store_exactly() {
        let mut mine = MineState::new("pit", "world".into(), IVec3::ZERO, IVec3::ONE);
        let mut weight = 0.123456789f64;
        for id in 1..200u16 {
            weight = (weight * 7.31 + 0.377).fract();
            mine.composition_mut().set(BlockSpec::of(id), weight).unwrap();
        }

        let json = serde_json::to_string_pretty(&MineRecord::from_state(&mine)).unwrap();
        let restored = serde_json::from_str::<MineRecord>(&json).unwrap().into_state(&worlds()).unwrap();
        for ((a, wa), (b, wb)) in mine.composition().iter().zip(restored.composition().iter()) {
            assert_eq!(a, b);
            assert_eq!(wa.to_bits(), wb.to_bits(), "weight of {} changed", a);
        }
    }

    #[test]
    fn test_numeric_warnings_accepted() {
        let mut value = sample_json();
        value["resetWarnings"] = json!([5, 3.0, "1"]);
        let mine = MineRecord::decode(value).unwrap().into_state(&worlds()).unwrap();
        assert_eq!(mine.reset_warnings(), &[5, 3, 1]);

        for bad in [json!([2.5]), json!([-1]), json!([-4.0])] {
            let mut value = sample_json();
            value["resetWarnings"] = bad;
            let err = MineRecord::decode(value).unwrap().into_state(&worlds()).unwrap_err();
            assert!(matches!(err, Error::InvalidWarning(_)), "{}", err);
        }
    }

    #[test]
    fn test_warnings_serialize_as_strings() {
        let mut mine = MineState::new("pit", "world".into(), IVec3::ZERO, IVec3::ONE);
        mine.set_reset_warnings(vec![5]);
        let value = serde_json::to_value(MineRecord::from_state(&mine)).unwrap();
        assert_eq!(value["resetWarnings"], json!(["5"]));
        assert_eq!(value["surface"], json!(""));
        assert_eq!(value["tpY"], json!(-1));
    }
}
