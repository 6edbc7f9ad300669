use serde::{Deserialize, Serialize};
use std::ops::Range;
use strum_macros::{AsRefStr, EnumString};

/// How a statistic is tested against a `[lo, hi)` threshold band.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RangeMode {
    /// Membership in an integer range: only whole numbers inside the band
    /// match, so 12.5 is not in `[10, 15)`.
    #[default]
    IntegerRange,
    /// Plain `lo <= value < hi`.
    Numeric,
}

impl RangeMode {
    pub fn contains(self, range: Range<i64>, value: f64) -> bool {
        let (lo, hi) = (range.start as f64, range.end as f64);
        let in_band = lo <= value && value < hi;
        match self {
            RangeMode::IntegerRange => in_band && value.fract() == 0.0,
            RangeMode::Numeric => in_band,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, AsRefStr)]
pub enum SpecularFinish {
    #[strum(serialize = "dull")]
    Dull,
    #[strum(serialize = "glossy")]
    Glossy,
    #[strum(serialize = "extra shiny")]
    ExtraShiny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, AsRefStr)]
pub enum RoughnessLevel {
    #[strum(serialize = "decently smooth")]
    DecentlySmooth,
    #[strum(serialize = "a bit rough")]
    ABitRough,
    #[strum(serialize = "pretty rough")]
    PrettyRough,
}

// the wording says roughness although it is derived from the normals map,
// downstream captions depend on these exact strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, AsRefStr)]
pub enum NormalsRoughness {
    #[strum(serialize = "low roughness")]
    Low,
    #[strum(serialize = "average roughness")]
    Average,
    #[strum(serialize = "high roughness")]
    High,
}

pub fn describe_specular(value: f64) -> SpecularFinish {
    describe_specular_with_mode(value, RangeMode::default())
}

pub fn describe_specular_with_mode(value: f64, mode: RangeMode) -> SpecularFinish {
    if mode.contains(10..15, value) {
        SpecularFinish::Dull
    } else if mode.contains(15..20, value) {
        SpecularFinish::Glossy
    } else {
        SpecularFinish::ExtraShiny
    }
}

pub fn describe_roughness(value: f64) -> RoughnessLevel {
    describe_roughness_with_mode(value, RangeMode::default())
}

pub fn describe_roughness_with_mode(value: f64, mode: RangeMode) -> RoughnessLevel {
    if mode.contains(50..100, value) {
        RoughnessLevel::DecentlySmooth
    } else if mode.contains(100..150, value) {
        RoughnessLevel::ABitRough
    } else {
        RoughnessLevel::PrettyRough
    }
}

/// `stdev_value` does not take part in the decision.
pub fn describe_normals(avg_value: f64, stdev_value: f64) -> NormalsRoughness {
    describe_normals_with_mode(avg_value, stdev_value, RangeMode::default())
}

pub fn describe_normals_with_mode(
    avg_value: f64,
    _stdev_value: f64,
    mode: RangeMode,
) -> NormalsRoughness {
    if avg_value < 160.0 {
        NormalsRoughness::Low
    } else if mode.contains(160..170, avg_value) {
        NormalsRoughness::Average
    } else {
        NormalsRoughness::High
    }
}

/// The `(specular, roughness, normals)` labels for one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvbrdfDescriptors {
    pub specular: SpecularFinish,
    pub roughness: RoughnessLevel,
    pub normals: NormalsRoughness,
}

impl SvbrdfDescriptors {
    pub fn from_averages(specular: f64, roughness: f64, normals: f64, mode: RangeMode) -> Self {
        Self {
            specular: describe_specular_with_mode(specular, mode),
            roughness: describe_roughness_with_mode(roughness, mode),
            normals: describe_normals_with_mode(normals, 0.0, mode),
        }
    }

    pub fn labels(&self) -> [&str; 3] {
        [
            self.specular.as_ref(),
            self.roughness.as_ref(),
            self.normals.as_ref(),
        ]
    }

    /// Renders the triple as `('dull', 'decently smooth', 'low roughness')`.
    pub fn as_tuple(&self) -> String {
        let quoted = self
            .labels()
            .iter()
            .map(|v| format!("'{}'", v))
            .collect::<Vec<String>>();
        format!("({})", quoted.join(", "))
    }
}
