//! Build a cumulative antibiogram from laboratory isolate and AST extracts.
//!
//! The pipeline is: load both tables, keep the first isolate per patient and organism, join the
//! AST results onto those isolates by specimen, then aggregate percent susceptible per organism
//! and antimicrobial. Everything downstream (matrices, summaries, reports) is derived from the
//! aggregated rows.
pub mod ast;
mod bands;
pub mod config;
pub mod isolates;
pub mod key;
pub mod matrix;
pub mod report;
pub mod summary;
pub mod susceptibility;
pub mod taxonomy;
mod util;

pub use anyhow::{Context, Error};
use qu::ick_use::*;
use serde::Serialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

pub use crate::{
    ast::{AstResult, AstResults, Interpretation},
    bands::{Band, BandCounts, BANDS},
    config::Config,
    isolates::{Isolate, Isolates},
    key::SpecimenKey,
    report::Antibiogram,
    summary::Summary,
    susceptibility::{Susceptibility, SusceptibilityRow},
    taxonomy::OrganismGroup,
    util::{header, ResultExt},
};

pub type ArcStr = Arc<str>;
pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

/// Open one of the input tables, failing with a message naming it if it is not there.
fn open_table(path: &Path, what: &str) -> Result<fs::File> {
    if !util::path_exists(path)? {
        bail!("missing source file for {}: \"{}\"", what, path.display());
    }
    fs::File::open(path).with_context(|| format!("could not open \"{}\"", path.display()))
}

/// Positions of a fixed set of named columns in a CSV header.
struct Columns<const N: usize>([usize; N]);

impl<const N: usize> Columns<N> {
    /// Find each of `names` in `headers`. Every column is required.
    fn resolve(headers: &csv::StringRecord, names: [&str; N]) -> Result<Self> {
        let mut positions = [0; N];
        for (pos, name) in positions.iter_mut().zip(names) {
            *pos = headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or_else(|| format_err!("missing column \"{}\"", name))?;
        }
        Ok(Columns(positions))
    }

    /// The fields for our columns from `record`. Short rows read as empty fields and extra
    /// trailing fields are ignored, so readers must be built with `flexible(true)`.
    fn fields<'r>(&self, record: &'r csv::StringRecord) -> [&'r str; N] {
        std::array::from_fn(|idx| record.get(self.0[idx]).unwrap_or(""))
    }
}

/// Save rows as CSV.
fn save_csv<T: Serialize>(contents: &[T], path: impl AsRef<Path>) -> Result {
    fn inner<T: Serialize>(contents: &[T], path: &Path) -> Result {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("could not create parent")?;
        }
        if util::path_exists(path)? {
            event!(
                Level::WARN,
                "overwriting existing file at \"{}\"",
                path.display()
            );
        }
        let mut out = csv::Writer::from_writer(io::BufWriter::new(fs::File::create(path)?));
        for row in contents {
            out.serialize(row)?;
        }
        out.flush()?;
        Ok(())
    }
    let path = path.as_ref();
    check_extension(path, "csv")?;

    inner(contents, path).with_context(|| format!("unable to save data to \"{}\"", path.display()))
}

/// Note: No protection from escaping the root directory.
pub fn input_path(input: &Path) -> PathBuf {
    Path::new("../data/input").join(input)
}

/// Note: No protection from escaping the root directory.
pub fn output_path(input: &Path) -> PathBuf {
    Path::new("../data/output").join(input)
}

pub fn check_extension(path: &Path, ext: &str) -> Result<()> {
    ensure!(
        matches!(path.extension(), Some(p) if p == ext),
        "filename should end with `.{}`",
        ext
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{check_extension, Columns};
    use std::path::Path;

    #[test]
    fn columns_by_name() {
        let headers = csv::StringRecord::from(vec!["Organism", " Specimen ", "Patient"]);
        let columns = Columns::resolve(&headers, ["Specimen", "Organism"]).unwrap();
        let record = csv::StringRecord::from(vec!["E. coli", "1001"]);
        assert_eq!(columns.fields(&record), ["1001", "E. coli"]);
        // short row
        let record = csv::StringRecord::from(vec!["E. coli"]);
        assert_eq!(columns.fields(&record), ["", "E. coli"]);
    }

    #[test]
    fn missing_column() {
        let headers = csv::StringRecord::from(vec!["Organism", "Patient"]);
        let err = Columns::resolve(&headers, ["Specimen"]).err().unwrap();
        assert_eq!(err.to_string(), "missing column \"Specimen\"");
    }

    #[test]
    fn extensions() {
        assert!(check_extension(Path::new("out/isolates.csv"), "csv").is_ok());
        assert!(check_extension(Path::new("out/isolates.bin"), "csv").is_err());
        assert!(check_extension(Path::new("out/isolates"), "csv").is_err());
    }
}
