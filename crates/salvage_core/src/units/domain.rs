//! Physical domains and the unit alias table.
//!
//! The alias table is a stable contract: archetype files and saved search
//! expressions written against one version must keep converting the same way.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Category of measurable quantity with one canonical base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitDomain {
    /// Lengths, diameters. Base: mm.
    Dimension,
    /// Electric potential. Base: V.
    #[serde(alias = "tension")]
    Voltage,
    /// Electric current. Base: A.
    #[serde(alias = "courant")]
    Current,
    /// Base: Ω.
    Resistance,
    /// Base: µF.
    #[serde(alias = "capacite")]
    Capacitance,
    /// Base: bar.
    #[serde(alias = "pression")]
    Pressure,
    /// Base: rpm.
    #[serde(alias = "vitesse_rot")]
    RotationalSpeed,
    /// Base: W.
    #[serde(alias = "puissance")]
    Power,
}

impl UnitDomain {
    pub const ALL: [UnitDomain; 8] = [
        Self::Dimension,
        Self::Voltage,
        Self::Current,
        Self::Resistance,
        Self::Capacitance,
        Self::Pressure,
        Self::RotationalSpeed,
        Self::Power,
    ];

    /// Canonical unit every value of this domain is stored in.
    pub fn base_unit(self) -> &'static str {
        match self {
            Self::Dimension => "mm",
            Self::Voltage => "V",
            Self::Current => "A",
            Self::Resistance => "Ω",
            Self::Capacitance => "µF",
            Self::Pressure => "bar",
            Self::RotationalSpeed => "rpm",
            Self::Power => "W",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dimension => "dimension",
            Self::Voltage => "voltage",
            Self::Current => "current",
            Self::Resistance => "resistance",
            Self::Capacitance => "capacitance",
            Self::Pressure => "pressure",
            Self::RotationalSpeed => "rotational_speed",
            Self::Power => "power",
        }
    }

    /// Short list of aliases shown to users after an unknown-unit error.
    pub fn suggested_units(self) -> &'static [&'static str] {
        match self {
            Self::Dimension => &["mm", "cm", "m", "in", "inch", "pouce"],
            Self::Voltage => &["V", "mV", "kV", "volt"],
            Self::Current => &["A", "mA", "amp"],
            Self::Resistance => &["Ohm", "kOhm", "Ω"],
            Self::Capacitance => &["uF", "µF", "nF", "pF", "mF", "F"],
            Self::Pressure => &["bar", "psi", "Pa", "kPa"],
            Self::RotationalSpeed => &["rpm", "tr/min", "tpm"],
            Self::Power => &["W", "kW", "mW", "watt"],
        }
    }
}

impl Display for UnitDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversion entry for one accepted unit string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitAlias {
    pub alias: &'static str,
    pub domain: UnitDomain,
    /// Multiplier converting a magnitude in `alias` to the domain base unit.
    pub to_base: f64,
}

const fn alias(alias: &'static str, domain: UnitDomain, to_base: f64) -> UnitAlias {
    UnitAlias {
        alias,
        domain,
        to_base,
    }
}

use UnitDomain::{
    Capacitance, Current, Dimension, Power, Pressure, Resistance, RotationalSpeed, Voltage,
};

const UNIT_ALIASES: &[UnitAlias] = &[
    alias("mm", Dimension, 1.0),
    alias("cm", Dimension, 10.0),
    alias("m", Dimension, 1000.0),
    alias("in", Dimension, 25.4),
    alias("inch", Dimension, 25.4),
    alias("pouce", Dimension, 25.4),
    alias("\"", Dimension, 25.4),
    alias("v", Voltage, 1.0),
    alias("V", Voltage, 1.0),
    alias("volt", Voltage, 1.0),
    alias("volts", Voltage, 1.0),
    alias("mV", Voltage, 0.001),
    alias("mv", Voltage, 0.001),
    alias("kV", Voltage, 1000.0),
    alias("kv", Voltage, 1000.0),
    alias("a", Current, 1.0),
    alias("A", Current, 1.0),
    alias("amp", Current, 1.0),
    alias("ampere", Current, 1.0),
    alias("mA", Current, 0.001),
    alias("ma", Current, 0.001),
    alias("ohm", Resistance, 1.0),
    alias("Ohm", Resistance, 1.0),
    alias("Ω", Resistance, 1.0),
    alias("kohm", Resistance, 1000.0),
    alias("kOhm", Resistance, 1000.0),
    alias("kΩ", Resistance, 1000.0),
    // Ambiguous, but the usual shorthand on resistor markings.
    alias("k", Resistance, 1000.0),
    alias("F", Capacitance, 1_000_000.0),
    alias("mF", Capacitance, 1000.0),
    alias("uF", Capacitance, 1.0),
    alias("µF", Capacitance, 1.0),
    alias("nF", Capacitance, 0.001),
    alias("pF", Capacitance, 0.000_001),
    alias("bar", Pressure, 1.0),
    alias("psi", Pressure, 0.068_947_6),
    alias("Pa", Pressure, 0.000_01),
    alias("kPa", Pressure, 0.01),
    alias("MPa", Pressure, 10.0),
    alias("rpm", RotationalSpeed, 1.0),
    alias("tr/min", RotationalSpeed, 1.0),
    alias("tpm", RotationalSpeed, 1.0),
    alias("w", Power, 1.0),
    alias("W", Power, 1.0),
    alias("watt", Power, 1.0),
    alias("mW", Power, 0.001),
    alias("kW", Power, 1000.0),
];

/// Looks up one unit string (case-sensitive).
pub fn lookup_unit(unit: &str) -> Option<&'static UnitAlias> {
    UNIT_ALIASES.iter().find(|entry| entry.alias == unit)
}

/// Returns every accepted alias of one domain, sorted.
pub fn accepted_units(domain: UnitDomain) -> Vec<&'static str> {
    let mut units = UNIT_ALIASES
        .iter()
        .filter(|entry| entry.domain == domain)
        .map(|entry| entry.alias)
        .collect::<Vec<_>>();
    units.sort_unstable();
    units
}

/// Guesses which domain a mistyped unit was aiming for.
///
/// Heuristic substring checks on the lower-cased text, evaluated in a fixed
/// order; the first hit wins.
pub fn guess_domain(unit: &str) -> Option<UnitDomain> {
    let lower = unit.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("m") || has("inch") || has("pouce") {
        Some(Dimension)
    } else if has("v") {
        Some(Voltage)
    } else if has("a") {
        Some(Current)
    } else if has("ohm") || has("ω") {
        Some(Resistance)
    } else if has("f") {
        Some(Capacitance)
    } else if has("bar") || has("psi") || has("pa") {
        Some(Pressure)
    } else if has("rpm") || has("tr") || has("min") {
        Some(RotationalSpeed)
    } else if has("w") {
        Some(Power)
    } else {
        None
    }
}
