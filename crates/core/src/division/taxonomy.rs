//! Fixed division taxonomy (CSC MasterFormat-like).
//!
//! The taxonomy is reference data handed to the ledger at startup. Budget
//! lines and change orders carry a free-form code (`03`, `03 30 00`, `0330`)
//! that is classified by its first two characters, the division group.

use serde::{Deserialize, Serialize};

use super::error::DivisionError;

/// A classification division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Division {
    /// Division code, e.g. `03` or `03 00 00`.
    pub code: String,
    /// Human-readable name.
    pub name: String,
}

impl Division {
    /// Creates a division entry.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Two-character group this division represents.
    ///
    /// Only meaningful for divisions accepted by [`DivisionTaxonomy::new`].
    #[must_use]
    pub fn group(&self) -> &str {
        group_of(&self.code).unwrap_or_default()
    }
}

/// Returns the two-character group of a code, if it has one.
#[must_use]
pub fn group_of(code: &str) -> Option<&str> {
    let group = code.trim().get(..2)?;
    group
        .chars()
        .all(|c| c.is_ascii_alphanumeric())
        .then_some(group)
}

/// Ordered list of divisions, validated for unique groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionTaxonomy {
    divisions: Vec<Division>,
}

impl DivisionTaxonomy {
    /// Builds a taxonomy, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if a code has no two-character group, a name is
    /// empty, or two entries share a group.
    pub fn new(divisions: Vec<Division>) -> Result<Self, DivisionError> {
        let mut seen: Vec<&str> = Vec::with_capacity(divisions.len());
        for division in &divisions {
            let group = group_of(&division.code)
                .ok_or_else(|| DivisionError::InvalidCode(division.code.clone()))?;
            if division.name.trim().is_empty() {
                return Err(DivisionError::EmptyName(division.code.clone()));
            }
            if seen.contains(&group) {
                return Err(DivisionError::DuplicateGroup(group.to_string()));
            }
            seen.push(group);
        }

        Ok(Self { divisions })
    }

    /// Parses a JSON array of `{ "code": ..., "name": ... }` objects.
    ///
    /// # Errors
    ///
    /// Returns `DivisionError::Malformed` for invalid JSON or unknown fields,
    /// and the errors of [`DivisionTaxonomy::new`] for invalid entries.
    pub fn from_json(json: &str) -> Result<Self, DivisionError> {
        let divisions: Vec<Division> =
            serde_json::from_str(json).map_err(|e| DivisionError::Malformed(e.to_string()))?;
        Self::new(divisions)
    }

    /// Built-in CSC MasterFormat 2016 division list.
    #[must_use]
    pub fn masterformat() -> Self {
        let divisions = MASTERFORMAT
            .iter()
            .map(|(code, name)| Division::new(*code, *name))
            .collect();
        Self { divisions }
    }

    /// Divisions in taxonomy order.
    #[must_use]
    pub fn divisions(&self) -> &[Division] {
        &self.divisions
    }

    /// Number of divisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.divisions.len()
    }

    /// Returns true if the taxonomy has no divisions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.divisions.is_empty()
    }

    /// Finds the division a code belongs to.
    ///
    /// # Errors
    ///
    /// Returns `DivisionError::InvalidCode` if the code has no two-character
    /// group and `DivisionError::Unknown` if no division has that group.
    pub fn classify(&self, code: &str) -> Result<&Division, DivisionError> {
        let group = group_of(code).ok_or_else(|| DivisionError::InvalidCode(code.to_string()))?;
        self.divisions
            .iter()
            .find(|d| d.group() == group)
            .ok_or_else(|| DivisionError::Unknown(code.trim().to_string()))
    }

    /// Returns true if `code` classifies into a known division.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.classify(code).is_ok()
    }
}

impl Default for DivisionTaxonomy {
    fn default() -> Self {
        Self::masterformat()
    }
}

const MASTERFORMAT: &[(&str, &str)] = &[
    ("00", "Procurement and Contracting Requirements"),
    ("01", "General Requirements"),
    ("02", "Existing Conditions"),
    ("03", "Concrete"),
    ("04", "Masonry"),
    ("05", "Metals"),
    ("06", "Wood, Plastics, and Composites"),
    ("07", "Thermal and Moisture Protection"),
    ("08", "Openings"),
    ("09", "Finishes"),
    ("10", "Specialties"),
    ("11", "Equipment"),
    ("12", "Furnishings"),
    ("13", "Special Construction"),
    ("14", "Conveying Equipment"),
    ("21", "Fire Suppression"),
    ("22", "Plumbing"),
    ("23", "Heating, Ventilating, and Air Conditioning"),
    ("25", "Integrated Automation"),
    ("26", "Electrical"),
    ("27", "Communications"),
    ("28", "Electronic Safety and Security"),
    ("31", "Earthwork"),
    ("32", "Exterior Improvements"),
    ("33", "Utilities"),
    ("34", "Transportation"),
    ("35", "Waterway and Marine Construction"),
    ("40", "Process Interconnections"),
    ("41", "Material Processing and Handling Equipment"),
    ("42", "Process Heating, Cooling, and Drying Equipment"),
    ("43", "Process Gas and Liquid Handling, Purification, and Storage Equipment"),
    ("44", "Pollution and Waste Control Equipment"),
    ("45", "Industry-Specific Manufacturing Equipment"),
    ("46", "Water and Wastewater Equipment"),
    ("48", "Electrical Power Generation"),
];
