//! Headline numbers for the report.
use crate::{bands::BandCounts, isolates::Isolates, susceptibility::Susceptibility};
use serde::Serialize;

/// Summary scalars over the whole antibiogram, including organisms classified as `Other`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Isolates left after deduplication.
    pub unique_isolates: usize,
    /// Distinct organisms with at least one aggregated row.
    pub organisms: usize,
    /// Unweighted mean of percent susceptible over all organism/antibiotic pairs. `None` when
    /// nothing was aggregated.
    pub mean_percent_susceptible: Option<f64>,
    /// Distinct antibiotics with at least one aggregated row.
    pub antibiotics: usize,
    /// How the organism/antibiotic pairs spread over the display bands.
    pub bands: BandCounts,
}

impl Summary {
    pub fn new(unique: &Isolates, susceptibility: &Susceptibility) -> Self {
        Summary {
            unique_isolates: unique.len(),
            organisms: susceptibility.organisms().len(),
            mean_percent_susceptible: susceptibility.mean_percent_susceptible(),
            antibiotics: susceptibility.antibiotics().len(),
            bands: BandCounts::bucket_values(
                susceptibility.rows().iter().map(|row| row.percent_susceptible),
            ),
        }
    }

    /// The mean as shown to readers: whole percent, truncated, or "n/a".
    pub fn mean_display(&self) -> String {
        match self.mean_percent_susceptible {
            Some(mean) => format!("{}%", mean.trunc()),
            None => "n/a".into(),
        }
    }

    /// Name/value pairs for printing.
    pub fn scalars(&self) -> [(&'static str, String); 4] {
        [
            ("Unique Isolates", self.unique_isolates.to_string()),
            ("Organisms Identified", self.organisms.to_string()),
            ("Avg. Susceptibility", self.mean_display()),
            ("Antibiotics Tested", self.antibiotics.to_string()),
        ]
    }

    pub fn term_table(&self) -> term_data_table::Table {
        use term_data_table::{Cell, Row, Table};
        let mut table = Table::new();
        for (name, value) in self.scalars() {
            table.add_row(Row::new().with_cell(Cell::from(name)).with_cell(Cell::from(value)));
        }
        table
    }
}
