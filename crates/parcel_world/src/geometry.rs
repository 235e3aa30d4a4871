use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in a named world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

/// Grid identity of a parcel inside its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParcelId {
    pub x: i32,
    pub z: i32,
}

impl ParcelId {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for ParcelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.x, self.z)
    }
}

impl From<ParcelId> for String {
    fn from(value: ParcelId) -> Self {
        value.to_string()
    }
}

/// Accepts `x;z`, `x,z` and `x.z` forms.
impl FromStr for ParcelId {
    type Err = ParcelIdParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let mut parts = trimmed.splitn(2, [';', ',', '.']);
        let x = parts.next().unwrap_or_default().trim();
        let z = parts.next().unwrap_or_default().trim();
        let x = x
            .parse::<i32>()
            .map_err(|_| ParcelIdParseError { input: trimmed.to_string() })?;
        let z = z
            .parse::<i32>()
            .map_err(|_| ParcelIdParseError { input: trimmed.to_string() })?;
        Ok(Self { x, z })
    }
}

impl TryFrom<String> for ParcelId {
    type Error = ParcelIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelIdParseError {
    pub input: String,
}

impl fmt::Display for ParcelIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid parcel id: {:?}", self.input)
    }
}

impl std::error::Error for ParcelIdParseError {}

/// Axis-aligned horizontal bounds of a region within its world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub min_x: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_z: f64,
}

impl RegionBounds {
    pub fn contains(&self, x: f64, z: f64) -> bool {
        x >= self.min_x && x < self.max_x && z >= self.min_z && z < self.max_z
    }
}
