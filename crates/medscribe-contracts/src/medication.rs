//! Medication and allergy records.
//!
//! Every field other than the drug name or allergen is optional: a mention
//! with no recoverable dosing detail still yields a partial record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dose unit, in its charted abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoseUnit {
    #[serde(rename = "mg")]
    Mg,
    #[serde(rename = "mcg")]
    Mcg,
    #[serde(rename = "g")]
    G,
    #[serde(rename = "mL")]
    Ml,
    #[serde(rename = "units")]
    Units,
    #[serde(rename = "tablets")]
    Tablets,
    #[serde(rename = "puffs")]
    Puffs,
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DoseUnit::Mg => "mg",
            DoseUnit::Mcg => "mcg",
            DoseUnit::G => "g",
            DoseUnit::Ml => "mL",
            DoseUnit::Units => "units",
            DoseUnit::Tablets => "tablets",
            DoseUnit::Puffs => "puffs",
        };
        f.write_str(s)
    }
}

/// Route of administration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    #[serde(rename = "PO")]
    Po,
    #[serde(rename = "IV")]
    Iv,
    #[serde(rename = "IM")]
    Im,
    #[serde(rename = "SQ")]
    Sq,
    #[serde(rename = "SL")]
    Sl,
    #[serde(rename = "PR")]
    Pr,
    #[serde(rename = "topical")]
    Topical,
    #[serde(rename = "inhaled")]
    Inhaled,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Route::Po => "PO",
            Route::Iv => "IV",
            Route::Im => "IM",
            Route::Sq => "SQ",
            Route::Sl => "SL",
            Route::Pr => "PR",
            Route::Topical => "topical",
            Route::Inhaled => "inhaled",
        };
        f.write_str(s)
    }
}

/// Dosing frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "BID")]
    Bid,
    #[serde(rename = "TID")]
    Tid,
    #[serde(rename = "QID")]
    Qid,
    #[serde(rename = "Q4H")]
    Q4h,
    #[serde(rename = "Q6H")]
    Q6h,
    #[serde(rename = "PRN")]
    Prn,
    #[serde(rename = "QHS")]
    Qhs,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Daily => "daily",
            Frequency::Bid => "BID",
            Frequency::Tid => "TID",
            Frequency::Qid => "QID",
            Frequency::Q4h => "Q4H",
            Frequency::Q6h => "Q6H",
            Frequency::Prn => "PRN",
            Frequency::Qhs => "QHS",
        };
        f.write_str(s)
    }
}

/// Whether the drug is a home medication or was given during the encounter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Home,
    Administered,
    #[default]
    Unspecified,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Origin::Home => "home",
            Origin::Administered => "administered",
            Origin::Unspecified => "unspecified",
        };
        f.write_str(s)
    }
}

/// A single medication mention, possibly partial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    /// Canonical (generic) drug name.
    pub name: String,
    /// Numeric dose exactly as spoken, e.g. "10" or "0.5".
    pub dose: Option<String>,
    pub unit: Option<DoseUnit>,
    pub route: Option<Route>,
    pub frequency: Option<Frequency>,
    pub indication: Option<String>,
    pub origin: Origin,
}

impl Medication {
    /// A record carrying only the drug name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dose: None,
            unit: None,
            route: None,
            frequency: None,
            indication: None,
            origin: Origin::Unspecified,
        }
    }

    /// Fill every empty field from `other`. Fields already set are kept.
    pub fn merge_missing(&mut self, other: Medication) {
        // Dose and unit travel together.
        if self.dose.is_none() && other.dose.is_some() {
            self.dose = other.dose;
            self.unit = other.unit;
        }
        self.route = self.route.or(other.route);
        self.frequency = self.frequency.or(other.frequency);
        if self.indication.is_none() {
            self.indication = other.indication;
        }
        if self.origin == Origin::Unspecified {
            self.origin = other.origin;
        }
    }
}

impl fmt::Display for Medication {
    /// Charting form: `Lisinopril 10 mg PO daily (for high blood pressure)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(dose) = &self.dose {
            write!(f, " {dose}")?;
        }
        if let Some(unit) = self.unit {
            write!(f, " {unit}")?;
        }
        if let Some(route) = self.route {
            write!(f, " {route}")?;
        }
        if let Some(frequency) = self.frequency {
            write!(f, " {frequency}")?;
        }
        if let Some(indication) = &self.indication {
            write!(f, " (for {indication})")?;
        }
        Ok(())
    }
}

/// Allergy severity tiers, mildest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllergySeverity {
    Mild,
    Moderate,
    Severe,
    Anaphylaxis,
}

impl fmt::Display for AllergySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AllergySeverity::Mild => "mild",
            AllergySeverity::Moderate => "moderate",
            AllergySeverity::Severe => "severe",
            AllergySeverity::Anaphylaxis => "anaphylaxis",
        };
        f.write_str(s)
    }
}

/// A documented allergy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allergy {
    pub allergen: String,
    pub reaction: Option<String>,
    pub severity: Option<AllergySeverity>,
}

impl fmt::Display for Allergy {
    /// Charting form: `penicillin: hives (moderate)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.allergen)?;
        if let Some(reaction) = &self.reaction {
            write!(f, ": {reaction}")?;
        }
        if let Some(severity) = self.severity {
            write!(f, " ({severity})")?;
        }
        Ok(())
    }
}
