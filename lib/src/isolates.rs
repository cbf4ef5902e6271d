//! The isolates table, and first-isolate deduplication.
use crate::{
    config::IsolatesConfig, key::SpecimenKey, open_table, util, ArcStr, Columns, Result,
};
use chrono::NaiveDateTime;
use itertools::{Either, Itertools};
use qu::ick_use::*;
use serde::Serialize;
use std::{collections::BTreeMap, io, iter, ops::Deref, path::Path, sync::Arc};

/// One organism identified from one specimen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Isolate {
    pub specimen: SpecimenKey,
    pub organism: ArcStr,
    pub patient_id: ArcStr,
    /// `None` if the timestamp was blank or could not be parsed.
    pub created_on: Option<NaiveDateTime>,
    pub sample_type: Option<ArcStr>,
}

/// The parsed list of isolates, with a pre-built index for the `specimen` field.
#[derive(Debug, Clone)]
pub struct Isolates {
    els: Arc<Vec<Isolate>>,
    specimen_idx: BTreeMap<SpecimenKey, Vec<usize>>,
}

impl Isolates {
    /// Load the isolates table named in the config.
    pub fn load(config: &IsolatesConfig) -> Result<Self> {
        let path = config.path.as_path();
        let reader = open_table(path, "isolates")?;
        Self::from_reader(reader, config)
            .with_context(|| format!("while loading isolates from \"{}\"", path.display()))
    }

    /// Read isolates from CSV, finding columns by the names in `config`.
    pub fn from_reader(reader: impl io::Read, config: &IsolatesConfig) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let columns = Columns::resolve(
            reader.headers()?,
            [
                config.specimen.as_str(),
                config.organism.as_str(),
                config.patient.as_str(),
                config.created_on.as_str(),
                config.sample_type.as_str(),
            ],
        )?;

        let mut els = vec![];
        let mut bad_dates = 0;
        for record in reader.records() {
            let record = record?;
            let [specimen, organism, patient_id, created_on, sample_type] =
                columns.fields(&record);
            let parsed_date = util::parse_timestamp(created_on, config.day_first);
            if parsed_date.is_none() && !created_on.is_empty() {
                bad_dates += 1;
            }
            els.push(Isolate {
                specimen: SpecimenKey::normalize(specimen),
                organism: organism.into(),
                patient_id: patient_id.into(),
                created_on: parsed_date,
                sample_type: util::optional_string(sample_type),
            });
        }
        if bad_dates > 0 {
            event!(
                Level::WARN,
                "{} isolates have an unparsable \"{}\" and will sort as undated",
                bad_dates,
                config.created_on
            );
        }
        Ok(Self::new(els))
    }

    /// Keep the first isolate per patient per organism (CLSI M39).
    ///
    /// Within a (patient, organism) group the earliest timestamp wins. Undated isolates sort
    /// before dated ones, and ties are broken by original row order, so the same table always
    /// gives the same result. The output is ordered by patient, then organism.
    pub fn first_isolates(&self) -> Self {
        let mut first: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for (idx, isolate) in self.els.iter().enumerate() {
            let key = (&*isolate.patient_id, &*isolate.organism);
            // strictly earlier only, so the earliest row keeps a tie
            let replace = match first.get(&key) {
                Some(&kept) => isolate.created_on < self.els[kept].created_on,
                None => true,
            };
            if replace {
                first.insert(key, idx);
            }
        }
        let unique: Self = first.values().map(|idx| self.els[*idx].clone()).collect();
        event!(
            Level::INFO,
            "deduplicated {} isolates to {} first isolates",
            self.len(),
            unique.len()
        );
        unique
    }

    /// All isolates cultured from the given specimen.
    pub fn for_specimen(&self, specimen: &str) -> impl Iterator<Item = &Isolate> + Clone + '_ {
        let idxs = match self.specimen_idx.get(specimen) {
            Some(idxs) => idxs,
            None => return Either::Left(iter::empty()),
        };
        Either::Right(idxs.iter().map(|idx| {
            self.els
                .get(*idx)
                .expect("inconsistent isolate specimen index")
        }))
    }

    /// Get an `Isolates` object containing only isolates that match the filter.
    pub fn filter(&self, f: impl Fn(&Isolate) -> bool) -> Self {
        self.iter().filter(|isolate| f(*isolate)).cloned().collect()
    }

    /// Only isolates from the given sample type.
    pub fn filter_by_sample_type(&self, sample_type: &str) -> Self {
        self.filter(|isolate| isolate.sample_type.as_deref() == Some(sample_type))
    }

    /// Number of isolates per sample type, most common first (ties by name).
    ///
    /// Isolates without a sample type are not counted.
    pub fn sample_type_counts(&self) -> Vec<(ArcStr, usize)> {
        let mut counts: BTreeMap<ArcStr, usize> = BTreeMap::new();
        for sample_type in self.iter().filter_map(|isolate| isolate.sample_type.as_ref()) {
            *counts.entry(sample_type.clone()).or_default() += 1;
        }
        counts
            .into_iter()
            .sorted_by(|(name_a, count_a), (name_b, count_b)| {
                count_b.cmp(count_a).then_with(|| name_a.cmp(name_b))
            })
            .collect()
    }

    /// The `n` most common sample types.
    pub fn top_sample_types(&self, n: usize) -> Vec<ArcStr> {
        self.sample_type_counts()
            .into_iter()
            .take(n)
            .map(|(name, _)| name)
            .collect()
    }

    /// How many isolates have no usable timestamp.
    pub fn undated(&self) -> usize {
        self.iter().filter(|isolate| isolate.created_on.is_none()).count()
    }

    /// How many isolates have a blank specimen identifier, and so can never be joined.
    pub fn blank_specimens(&self) -> usize {
        self.iter().filter(|isolate| isolate.specimen.is_blank()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Isolate> {
        self.els.iter()
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result {
        crate::save_csv(&self.els, path)
    }

    fn new(els: Vec<Isolate>) -> Self {
        let mut this = Isolates {
            els: Arc::new(els),
            specimen_idx: BTreeMap::new(),
        };
        this.rebuild_specimen_idx();
        this
    }

    fn rebuild_specimen_idx(&mut self) {
        self.specimen_idx.clear();
        for (idx, isolate) in self.els.iter().enumerate() {
            self.specimen_idx
                .entry(isolate.specimen.clone())
                .or_insert_with(Vec::new)
                .push(idx);
        }
    }
}

impl Deref for Isolates {
    type Target = [Isolate];
    fn deref(&self) -> &Self::Target {
        &*self.els
    }
}

impl<'a> IntoIterator for &'a Isolates {
    type IntoIter = std::slice::Iter<'a, Isolate>;
    type Item = &'a Isolate;
    fn into_iter(self) -> Self::IntoIter {
        self.els.iter()
    }
}

impl FromIterator<Isolate> for Isolates {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Isolate>,
    {
        Self::new(iter.into_iter().collect())
    }
}
