use crate::error::AnthemError;
use crate::types::SourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Receiver protocol family
///
/// Only the Gen1 RS-232 families are supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Series {
    D1,
    D2,
    #[default]
    D2v,
    Avm20,
    Avm30,
    Avm50,
    Mrx,
}

impl Series {
    /// All supported series, in form order
    pub const ALL: [Series; 7] = [
        Series::D1,
        Series::D2,
        Series::D2v,
        Series::Avm20,
        Series::Avm30,
        Series::Avm50,
        Series::Mrx,
    ];

    /// Identifier used in persisted entries
    pub fn as_str(&self) -> &'static str {
        match self {
            Series::D1 => "d1",
            Series::D2 => "d2",
            Series::D2v => "d2v",
            Series::Avm20 => "avm20",
            Series::Avm30 => "avm30",
            Series::Avm50 => "avm50",
            Series::Mrx => "mrx",
        }
    }

    /// Human readable label for selection forms
    pub fn label(&self) -> &'static str {
        match self {
            Series::D1 => "D1 Series",
            Series::D2 => "D2 Series",
            Series::D2v => "D2v Series",
            Series::Avm20 => "AVM 20",
            Series::Avm30 => "AVM 30",
            Series::Avm50 => "AVM 50",
            Series::Mrx => "MRX Series",
        }
    }

    /// Model string shown in device info (`D2V`, `AVM50`, ...)
    pub fn model(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// Built-in source names for this series
    ///
    /// Sources outside this table are named `Source <id>` when first seen.
    pub fn default_sources(&self) -> BTreeMap<SourceId, String> {
        let names: &[(SourceId, &str)] = match self {
            Series::D1 | Series::D2 | Series::D2v => &[(1, "CD"), (2, "Tuner"), (3, "Video 1"), (4, "Video 2")],
            Series::Avm20 | Series::Avm30 | Series::Avm50 => {
                &[(1, "CD"), (2, "Tuner"), (3, "Video 1"), (4, "Video 2"), (5, "Video 3")]
            }
            Series::Mrx => &[(1, "CD"), (2, "Tuner"), (3, "Video 1"), (4, "Video 2")],
        };

        names.iter().map(|(id, name)| (*id, name.to_string())).collect()
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Series {
    type Err = AnthemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Series::ALL
            .iter()
            .copied()
            .find(|series| series.as_str() == s)
            .ok_or_else(|| AnthemError::InvalidSeries(s.to_string()))
    }
}
