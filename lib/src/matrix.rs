//! Pivot susceptibility rows into an organism x antibiotic grid for display.
use crate::{susceptibility::SusceptibilityRow, ArcStr};
use qu::ick_use::*;
use serde::Serialize;
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

/// One organism's row in the matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRow {
    /// `<organism> (n=<isolates tested>)`
    pub label: ArcStr,
    pub organism: ArcStr,
    pub total_isolates: usize,
    /// One entry per column, `None` where the pair was never tested.
    pub values: Vec<Option<f64>>,
    /// Number of results behind each entry of `values`.
    pub tested: Vec<Option<usize>>,
}

impl MatrixRow {
    /// Percent susceptible and number tested for the cell in column `col`.
    pub fn cell(&self, col: usize) -> Option<(f64, usize)> {
        let pct = self.values.get(col).copied().flatten()?;
        let tested = self.tested.get(col).copied().flatten()?;
        Some((pct, tested))
    }
}

/// The hover/annotation text for a cell.
pub fn cell_text(cell: Option<(f64, usize)>) -> String {
    match cell {
        Some((pct, n)) => format!("{:.1}% Susceptible\nTested: {}", pct, n),
        None => "Not Tested".into(),
    }
}

/// A percent-susceptible heatmap.
///
/// Rows are sorted by label and columns by antibiotic name. A missing cell means "not tested"
/// and is never the same as 0%.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Matrix {
    rows: Vec<MatrixRow>,
    columns: Vec<ArcStr>,
}

/// The label shown for an organism row.
pub fn row_label(organism: &str, total_isolates: usize) -> String {
    format!("{} (n={})", organism, total_isolates)
}

impl Matrix {
    /// Pivot the given rows.
    ///
    /// Fails if two rows land in the same cell. The aggregation should make that impossible, so
    /// it indicates a bug upstream and must not be papered over.
    pub fn build<'a>(rows: impl IntoIterator<Item = &'a SusceptibilityRow>) -> Result<Self> {
        let mut organisms: BTreeMap<ArcStr, (ArcStr, usize)> = BTreeMap::new();
        let mut cells: BTreeMap<ArcStr, BTreeMap<ArcStr, (f64, usize)>> = BTreeMap::new();
        let mut columns = BTreeSet::new();

        for row in rows {
            let label: ArcStr = row_label(&row.organism, row.total_isolates_of_organism).into();
            match organisms.entry(label.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert((row.organism.clone(), row.total_isolates_of_organism));
                }
                Entry::Occupied(entry) => ensure!(
                    entry.get().0 == row.organism,
                    "organisms \"{}\" and \"{}\" share the row label \"{}\"",
                    entry.get().0,
                    row.organism,
                    label
                ),
            }
            match cells
                .entry(label.clone())
                .or_default()
                .entry(row.antibiotic.clone())
            {
                Entry::Vacant(entry) => {
                    entry.insert((row.percent_susceptible, row.isolates_tested));
                }
                Entry::Occupied(_) => bail!(
                    "more than one susceptibility result for \"{}\" / \"{}\"",
                    label,
                    row.antibiotic
                ),
            }
            columns.insert(row.antibiotic.clone());
        }

        let columns: Vec<ArcStr> = columns.into_iter().collect();
        let rows = organisms
            .into_iter()
            .map(|(label, (organism, total_isolates))| {
                let row_cells = &cells[&label];
                let (values, tested): (Vec<_>, Vec<_>) = columns
                    .iter()
                    .map(|col| match row_cells.get(col) {
                        Some((pct, n)) => (Some(*pct), Some(*n)),
                        None => (None, None),
                    })
                    .unzip();
                MatrixRow {
                    label,
                    organism,
                    total_isolates,
                    values,
                    tested,
                }
            })
            .collect();

        Ok(Matrix { rows, columns })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    pub fn columns(&self) -> &[ArcStr] {
        &self.columns
    }

    /// Percent susceptible and number tested for a cell, `None` if not tested.
    ///
    /// Rows and columns are both sorted, so this is a pair of binary searches.
    pub fn cell(&self, label: &str, antibiotic: &str) -> Option<(f64, usize)> {
        let col = self
            .columns
            .binary_search_by(|c| (**c).cmp(antibiotic))
            .ok()?;
        let row = self
            .rows
            .binary_search_by(|row| (*row.label).cmp(label))
            .ok()?;
        self.rows[row].cell(col)
    }

    /// Percent susceptible for a cell, `None` if not tested.
    pub fn value(&self, label: &str, antibiotic: &str) -> Option<f64> {
        self.cell(label, antibiotic).map(|(pct, _)| pct)
    }

    /// Number of results behind a cell, `None` if not tested.
    pub fn tested(&self, label: &str, antibiotic: &str) -> Option<usize> {
        self.cell(label, antibiotic).map(|(_, n)| n)
    }

    /// The hover/annotation text for a cell.
    pub fn cell_text(&self, label: &str, antibiotic: &str) -> String {
        cell_text(self.cell(label, antibiotic))
    }

    /// Rows whose organism has fewer than `threshold` tested isolates.
    pub fn low_count_rows(&self, threshold: usize) -> impl Iterator<Item = &MatrixRow> + '_ {
        self.rows
            .iter()
            .filter(move |row| row.total_isolates < threshold)
    }
}

#[cfg(test)]
mod test {
    use super::Matrix;
    use crate::{susceptibility::SusceptibilityRow, taxonomy::OrganismGroup};

    fn row(
        organism: &str,
        antibiotic: &str,
        tested: usize,
        susceptible: usize,
        total: usize,
    ) -> SusceptibilityRow {
        SusceptibilityRow {
            organism: organism.into(),
            antibiotic: antibiotic.into(),
            group: OrganismGroup::classify(organism),
            isolates_tested: tested,
            susceptible,
            percent_susceptible: susceptible as f64 / tested as f64 * 100.,
            total_isolates_of_organism: total,
        }
    }

    #[test]
    fn pivot() {
        let rows = vec![
            row("Klebsiella pneumoniae", "Meropenem", 10, 9, 12),
            row("Escherichia coli", "Ampicillin", 40, 10, 42),
            row("Escherichia coli", "Meropenem", 42, 0, 42),
        ];
        let matrix = Matrix::build(&rows).unwrap();
        let labels: Vec<_> = matrix.rows().iter().map(|r| &*r.label).collect();
        assert_eq!(
            labels,
            ["Escherichia coli (n=42)", "Klebsiella pneumoniae (n=12)"]
        );
        let columns: Vec<_> = matrix.columns().iter().map(|c| &**c).collect();
        assert_eq!(columns, ["Ampicillin", "Meropenem"]);
        assert_eq!(matrix.rows()[0].values, [Some(25.), Some(0.)]);
        assert_eq!(matrix.rows()[1].values, [None, Some(90.)]);
        assert_eq!(matrix.rows()[1].tested, [None, Some(10)]);
        assert_eq!(matrix.rows()[0].cell(1), Some((0., 42)));
        assert_eq!(matrix.rows()[1].cell(0), None);
        assert_eq!(matrix.rows()[1].cell(5), None);
    }

    #[test]
    fn absent_is_not_zero() {
        let rows = vec![
            row("Escherichia coli", "Meropenem", 42, 0, 42),
            row("Klebsiella pneumoniae", "Ampicillin", 10, 9, 12),
        ];
        let matrix = Matrix::build(&rows).unwrap();
        assert_eq!(matrix.value("Escherichia coli (n=42)", "Meropenem"), Some(0.));
        assert_eq!(matrix.value("Escherichia coli (n=42)", "Ampicillin"), None);
        assert_eq!(matrix.tested("Escherichia coli (n=42)", "Meropenem"), Some(42));
        assert_eq!(matrix.tested("Escherichia coli (n=42)", "Ampicillin"), None);
        assert_eq!(
            matrix.cell_text("Klebsiella pneumoniae (n=12)", "Ampicillin"),
            "90.0% Susceptible\nTested: 10"
        );
        assert_eq!(
            matrix.cell_text("Escherichia coli (n=42)", "Ampicillin"),
            "Not Tested"
        );
    }

    #[test]
    fn duplicate_cell_fails() {
        let rows = vec![
            row("Escherichia coli", "Ampicillin", 40, 10, 42),
            row("Escherichia coli", "Ampicillin", 2, 2, 42),
        ];
        let err = Matrix::build(&rows).unwrap_err();
        assert!(err.to_string().contains("Ampicillin"), "{}", err);
    }

    #[test]
    fn empty() {
        let matrix = Matrix::build(&[]).unwrap();
        assert!(matrix.is_empty());
        assert!(matrix.columns().is_empty());
    }

    #[test]
    fn low_counts() {
        let rows = vec![
            row("Escherichia coli", "Ampicillin", 40, 10, 42),
            row("Proteus mirabilis", "Ampicillin", 3, 3, 3),
        ];
        let matrix = Matrix::build(&rows).unwrap();
        let low: Vec<_> = matrix.low_count_rows(30).map(|r| &*r.organism).collect();
        assert_eq!(low, ["Proteus mirabilis"]);
    }
}
