use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// One of the two independent image upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Person,
    Garment,
}

impl SlotKind {
    pub const ALL: [SlotKind; 2] = [SlotKind::Person, SlotKind::Garment];

    pub fn label(self) -> &'static str {
        match self {
            Self::Person => "Person photo",
            Self::Garment => "Garment photo",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Person => Self::Garment,
            Self::Garment => Self::Person,
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person => f.write_str("person"),
            Self::Garment => f.write_str("garment"),
        }
    }
}

/// Category that tells the synthesis service how to composite the garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmentType {
    #[default]
    Top,
    Bottom,
    Dress,
}

impl GarmentType {
    pub const ALL: [GarmentType; 3] = [GarmentType::Top, GarmentType::Bottom, GarmentType::Dress];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Dress => "dress",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Top => "Top",
            Self::Bottom => "Bottom",
            Self::Dress => "Dress",
        }
    }
}

impl fmt::Display for GarmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GarmentType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "dress" => Ok(Self::Dress),
            other => Err(ParseEnumError::new("garment type", other)),
        }
    }
}
