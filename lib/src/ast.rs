//! The antimicrobial susceptibility test (AST) results table.
use crate::{config::AstConfig, key::SpecimenKey, open_table, util, ArcStr, Columns, Result};
use qu::ick_use::*;
use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt, io, ops::Deref, sync::Arc};

/// The interpretation of a single AST result.
///
/// Raw values are trimmed and title-cased before matching, so `" susceptible"` and
/// `"SUSCEPTIBLE"` are both `Susceptible`. Anything else is kept as `Other` and still counts as
/// a test, it just never counts as susceptible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interpretation {
    Susceptible,
    Intermediate,
    Resistant,
    Other(ArcStr),
}

impl Interpretation {
    pub fn parse(raw: &str) -> Self {
        let normalized = util::title_case(raw.trim());
        match normalized.as_str() {
            "Susceptible" => Interpretation::Susceptible,
            "Intermediate" => Interpretation::Intermediate,
            "Resistant" => Interpretation::Resistant,
            _ => Interpretation::Other(normalized.into()),
        }
    }

    pub fn is_susceptible(&self) -> bool {
        matches!(self, Interpretation::Susceptible)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Interpretation::Susceptible => "Susceptible",
            Interpretation::Intermediate => "Intermediate",
            Interpretation::Resistant => "Resistant",
            Interpretation::Other(other) => &**other,
        }
    }
}

impl Serialize for Interpretation {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(self.as_str())
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row in the AST results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstResult {
    pub specimen: SpecimenKey,
    pub antimicrobial: ArcStr,
    pub interpretation: Interpretation,
}

/// The parsed list of AST results.
#[derive(Debug, Clone)]
pub struct AstResults {
    els: Arc<Vec<AstResult>>,
}

impl AstResults {
    /// Load the AST table named in the config.
    pub fn load(config: &AstConfig) -> Result<Self> {
        let path = config.path.as_path();
        let reader = open_table(path, "AST results")?;
        Self::from_reader(reader, config)
            .with_context(|| format!("while loading AST results from \"{}\"", path.display()))
    }

    /// Read AST results from CSV, finding columns by the names in `config`.
    pub fn from_reader(reader: impl io::Read, config: &AstConfig) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let columns = Columns::resolve(
            reader.headers()?,
            [
                config.specimen.as_str(),
                config.antimicrobial.as_str(),
                config.interpretation.as_str(),
            ],
        )?;
        let els = reader
            .records()
            .map(|record| -> Result<AstResult> {
                let record = record?;
                let [specimen, antimicrobial, interpretation] = columns.fields(&record);
                Ok(AstResult {
                    specimen: SpecimenKey::normalize(specimen),
                    antimicrobial: antimicrobial.into(),
                    interpretation: Interpretation::parse(interpretation),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(els))
    }

    /// Count how often each interpretation appears, after normalization.
    pub fn count_interpretations(&self) -> BTreeMap<Interpretation, usize> {
        // B Tree so we get a predictable ordering.
        let mut map = BTreeMap::new();
        // Manually insert to make sure the standard categories are included.
        map.insert(Interpretation::Susceptible, 0);
        map.insert(Interpretation::Intermediate, 0);
        map.insert(Interpretation::Resistant, 0);
        for el in self.els.iter() {
            *map.entry(el.interpretation.clone()).or_insert(0) += 1;
        }
        map
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AstResult> {
        self.els.iter()
    }

    fn new(els: Vec<AstResult>) -> Self {
        AstResults { els: Arc::new(els) }
    }
}

impl Deref for AstResults {
    type Target = [AstResult];
    fn deref(&self) -> &Self::Target {
        &*self.els
    }
}

impl FromIterator<AstResult> for AstResults {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = AstResult>,
    {
        Self::new(iter.into_iter().collect())
    }
}
