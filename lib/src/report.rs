//! Assemble the full antibiogram: overview matrices, per-sample-type sections and summary.
mod html;

use crate::{
    ast::AstResults,
    config::ReportConfig,
    isolates::Isolates,
    matrix::Matrix,
    summary::Summary,
    susceptibility::{JoinStats, SkippedGroup, Susceptibility},
    taxonomy::OrganismGroup,
    util, ArcStr, Result,
};
use chrono::{Local, NaiveDateTime};
use qu::ick_use::*;
use serde::Serialize;
use std::{fs, io, path::Path};

/// Groups shown in the overview. `Other` only contributes to the summary.
const OVERVIEW_GROUPS: [OrganismGroup; 3] = [
    OrganismGroup::GramNegative,
    OrganismGroup::GramPositive,
    OrganismGroup::Fungal,
];

/// Groups shown for each sample type.
const SAMPLE_TYPE_GROUPS: [OrganismGroup; 2] =
    [OrganismGroup::GramNegative, OrganismGroup::GramPositive];

/// The matrix for one organism group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupMatrix {
    pub group: OrganismGroup,
    pub matrix: Matrix,
}

impl GroupMatrix {
    fn build(susceptibility: &Susceptibility, group: OrganismGroup) -> Result<Self> {
        let matrix = Matrix::build(susceptibility.for_group(group))
            .with_context(|| format!("while building the {} matrix", group))?;
        Ok(GroupMatrix { group, matrix })
    }
}

/// The antibiogram restricted to isolates from one sample type.
#[derive(Debug, Clone, Serialize)]
pub struct SampleTypeSection {
    pub sample_type: ArcStr,
    /// Unique isolates of this sample type.
    pub isolates: usize,
    pub groups: Vec<GroupMatrix>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Antibiogram {
    pub title: String,
    pub institution: Option<String>,
    pub generated: NaiveDateTime,
    pub summary: Summary,
    pub overview: Vec<GroupMatrix>,
    pub sample_types: Vec<SampleTypeSection>,
    pub skipped: Vec<SkippedGroup>,
    pub join: JoinStats,
    /// Organism rows with fewer tested isolates than this are flagged.
    pub low_count_threshold: usize,
}

impl Antibiogram {
    /// Build the antibiogram from deduplicated isolates and all AST results.
    ///
    /// An empty join is not an error: the result has empty matrices and the caller should
    /// surface it.
    pub fn build(unique: &Isolates, ast: &AstResults, config: &ReportConfig) -> Result<Self> {
        let susceptibility = Susceptibility::calculate(unique, ast);
        let overview = OVERVIEW_GROUPS
            .into_iter()
            .map(|group| GroupMatrix::build(&susceptibility, group))
            .collect::<Result<Vec<_>>>()?;

        let mut sample_types = vec![];
        for sample_type in unique.top_sample_types(config.top_sample_types) {
            let subset = unique.filter_by_sample_type(&sample_type);
            let section_susceptibility = Susceptibility::calculate(&subset, ast);
            if section_susceptibility.is_empty() {
                event!(
                    Level::INFO,
                    "no susceptibility data for sample type \"{}\", skipping",
                    sample_type
                );
                continue;
            }
            let groups = SAMPLE_TYPE_GROUPS
                .into_iter()
                .map(|group| GroupMatrix::build(&section_susceptibility, group))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("for sample type \"{}\"", sample_type))?;
            sample_types.push(SampleTypeSection {
                sample_type,
                isolates: subset.len(),
                groups,
            });
        }

        Ok(Antibiogram {
            title: config.title.clone(),
            institution: config.institution.clone(),
            generated: Local::now().naive_local(),
            summary: Summary::new(unique, &susceptibility),
            overview,
            sample_types,
            skipped: susceptibility.skipped().to_vec(),
            join: susceptibility.join_stats(),
            low_count_threshold: config.low_count_threshold,
        })
    }

    /// Whether no organism/antibiotic pair was aggregated at all.
    pub fn is_empty(&self) -> bool {
        self.summary.mean_percent_susceptible.is_none()
    }

    pub fn group(&self, group: OrganismGroup) -> Option<&Matrix> {
        self.overview
            .iter()
            .find(|m| m.group == group)
            .map(|m| &m.matrix)
    }

    /// Render the report as a standalone HTML page.
    pub fn to_html(&self) -> String {
        html::render(self)
    }

    pub fn save_html(&self, path: impl AsRef<Path>) -> Result {
        let path = path.as_ref();
        crate::check_extension(path, "html")?;
        write_output(path, |out| {
            io::Write::write_all(out, self.to_html().as_bytes())?;
            Ok(())
        })
        .with_context(|| format!("unable to save report to \"{}\"", path.display()))
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result {
        let path = path.as_ref();
        crate::check_extension(path, "json")?;
        write_output(path, |out| {
            serde_json::to_writer_pretty(out, self)?;
            Ok(())
        })
        .with_context(|| format!("unable to save data to \"{}\"", path.display()))
    }
}

fn write_output(path: &Path, f: impl FnOnce(&mut io::BufWriter<fs::File>) -> Result) -> Result {
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
    let mut out = io::BufWriter::new(fs::File::create(path)?);
    f(&mut out)?;
    io::Write::flush(&mut out)?;
    Ok(())
}
