//! Drug → governing pharmacogene map.

use pharmaguard_common::{PharmaGuardError, Result};

use crate::rules::normalise_symbol;

const DRUG_GENES: &[(&str, &str)] = &[
    ("CODEINE",      "CYP2D6"),
    ("WARFARIN",     "CYP2C9"),
    ("CLOPIDOGREL",  "CYP2C19"),
    ("SIMVASTATIN",  "SLCO1B1"),
    ("AZATHIOPRINE", "TPMT"),
    ("FLUOROURACIL", "DPYD"),
];

/// The gene whose diplotype decides the response to `drug`.
pub fn primary_gene(drug: &str) -> Result<&'static str> {
    let drug = normalise_symbol(drug);
    DRUG_GENES
        .iter()
        .find(|(d, _)| *d == drug)
        .map(|(_, gene)| *gene)
        .ok_or(PharmaGuardError::UnsupportedDrug(drug))
}

pub fn supported_drugs() -> impl Iterator<Item = &'static str> {
    DRUG_GENES.iter().map(|(drug, _)| *drug)
}
