//! Percent-susceptible statistics per organism/antimicrobial pair.
//!
//! The calculation is
//!
//! ```text
//! %S = susceptible / (susceptible + intermediate + resistant + anything else) * 100
//! ```
//!
//! i.e. every result that was reported counts as a test, but only `Susceptible` counts towards
//! the numerator. AST results are linked to isolates through the specimen identifier, and only
//! results whose specimen survived deduplication are counted.
use crate::{
    ast::{AstResult, AstResults},
    isolates::{Isolate, Isolates},
    key::SpecimenKey,
    taxonomy::OrganismGroup,
    ArcStr,
};
use qu::ick_use::*;
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

/// One AST result joined to one isolate from the same specimen.
#[derive(Debug, Copy, Clone)]
pub struct JoinedResult<'a> {
    pub isolate: &'a Isolate,
    pub result: &'a AstResult,
}

/// What happened to the AST results during the join.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    /// AST results that were offered to the join.
    pub results: usize,
    /// AST results with no isolate for their specimen (or a blank specimen).
    pub unmatched: usize,
    /// Rows produced. May exceed `results - unmatched` when a specimen grew several organisms.
    pub joined: usize,
}

/// Inner join of AST results onto isolates by specimen.
///
/// A result is paired with every isolate from its specimen. Results without a matching isolate
/// are dropped and only counted; they usually belong to repeat isolates removed by
/// deduplication.
pub fn join<'a>(isolates: &'a Isolates, ast: &'a AstResults) -> (Vec<JoinedResult<'a>>, JoinStats) {
    let mut joined = vec![];
    let mut stats = JoinStats {
        results: ast.len(),
        ..JoinStats::default()
    };
    for result in ast.iter() {
        let before = joined.len();
        if !result.specimen.is_blank() {
            joined.extend(
                isolates
                    .for_specimen(&result.specimen)
                    .map(|isolate| JoinedResult { isolate, result }),
            );
        }
        if joined.len() == before {
            stats.unmatched += 1;
        }
    }
    stats.joined = joined.len();
    (joined, stats)
}

/// A row in the aggregated susceptibility table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SusceptibilityRow {
    pub organism: ArcStr,
    pub antibiotic: ArcStr,
    pub group: OrganismGroup,
    /// Number of results for this organism/antibiotic pair.
    pub isolates_tested: usize,
    pub susceptible: usize,
    /// 0 - 100
    pub percent_susceptible: f64,
    /// Distinct specimens of this organism with any AST result.
    pub total_isolates_of_organism: usize,
}

/// Why a group of joined results did not produce a row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    BlankOrganism,
    BlankAntimicrobial,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SkipReason::BlankOrganism => "organism name is blank",
            SkipReason::BlankAntimicrobial => "antimicrobial name is blank",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedGroup {
    pub organism: ArcStr,
    pub antibiotic: Option<ArcStr>,
    pub reason: SkipReason,
    /// Joined rows that were left out.
    pub rows: usize,
}

#[derive(Default)]
struct OrganismTally<'a> {
    specimens: BTreeSet<&'a SpecimenKey>,
    agents: BTreeMap<&'a str, AgentTally>,
    rows: usize,
}

#[derive(Default)]
struct AgentTally {
    tested: usize,
    susceptible: usize,
}

/// The aggregated susceptibility table for one set of isolates.
///
/// Rows are ordered by organism, then antibiotic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Susceptibility {
    rows: Vec<SusceptibilityRow>,
    skipped: Vec<SkippedGroup>,
    join: JoinStats,
}

impl Susceptibility {
    /// Join `ast` onto the (already deduplicated) `isolates` and aggregate.
    ///
    /// A join with no matches is not an error: the result is simply empty, and callers should
    /// check `is_empty`.
    pub fn calculate(isolates: &Isolates, ast: &AstResults) -> Self {
        let (joined, join) = join(isolates, ast);
        event!(
            Level::INFO,
            "joined {} of {} AST results to {} isolates ({} unmatched)",
            join.results - join.unmatched,
            join.results,
            isolates.len(),
            join.unmatched
        );
        if joined.is_empty() {
            event!(
                Level::WARN,
                "no AST results matched an isolate, check the specimen identifiers"
            );
            return Susceptibility {
                join,
                ..Susceptibility::default()
            };
        }

        let mut organisms: BTreeMap<&str, OrganismTally> = BTreeMap::new();
        for JoinedResult { isolate, result } in joined.iter().copied() {
            let tally = organisms.entry(&*isolate.organism).or_default();
            tally.rows += 1;
            tally.specimens.insert(&isolate.specimen);
            let agent = tally.agents.entry(&*result.antimicrobial).or_default();
            agent.tested += 1;
            if result.interpretation.is_susceptible() {
                agent.susceptible += 1;
            }
        }

        let mut rows = vec![];
        let mut skipped = vec![];
        // every tally was created by a joined row, so it has a specimen and each agent a test
        for (organism, tally) in organisms {
            if organism.is_empty() {
                skipped.push(SkippedGroup {
                    organism: organism.into(),
                    antibiotic: None,
                    reason: SkipReason::BlankOrganism,
                    rows: tally.rows,
                });
                continue;
            }

            let group = OrganismGroup::classify(organism);
            let total_isolates_of_organism = tally.specimens.len();
            for (agent, counts) in tally.agents {
                if agent.is_empty() {
                    skipped.push(SkippedGroup {
                        organism: organism.into(),
                        antibiotic: Some(agent.into()),
                        reason: SkipReason::BlankAntimicrobial,
                        rows: counts.tested,
                    });
                    continue;
                }
                rows.push(SusceptibilityRow {
                    organism: organism.into(),
                    antibiotic: agent.into(),
                    group,
                    isolates_tested: counts.tested,
                    susceptible: counts.susceptible,
                    percent_susceptible: counts.susceptible as f64 / counts.tested as f64 * 100.,
                    total_isolates_of_organism,
                });
            }
        }

        for skip in skipped.iter() {
            event!(
                Level::WARN,
                "skipping {} results for \"{}\"{}: {}",
                skip.rows,
                skip.organism,
                skip.antibiotic
                    .as_ref()
                    .map(|agent| format!(" / \"{}\"", agent))
                    .unwrap_or_default(),
                skip.reason
            );
        }

        Susceptibility {
            rows,
            skipped,
            join,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SusceptibilityRow] {
        &self.rows
    }

    pub fn skipped(&self) -> &[SkippedGroup] {
        &self.skipped
    }

    pub fn join_stats(&self) -> JoinStats {
        self.join
    }

    /// The rows reported in a group's antibiogram.
    ///
    /// For the fungal group this drops any agent that is not an antifungal.
    pub fn for_group(&self, group: OrganismGroup) -> impl Iterator<Item = &SusceptibilityRow> + '_ {
        self.rows
            .iter()
            .filter(move |row| row.group == group && group.reports_agent(&row.antibiotic))
    }

    /// Distinct organisms with at least one row.
    pub fn organisms(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|row| &*row.organism).collect()
    }

    /// Distinct antibiotics with at least one row.
    pub fn antibiotics(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|row| &*row.antibiotic).collect()
    }

    /// Unweighted mean of `percent_susceptible` over all rows, `None` if there are no rows.
    pub fn mean_percent_susceptible(&self) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        let total: f64 = self.rows.iter().map(|row| row.percent_susceptible).sum();
        Some(total / self.rows.len() as f64)
    }
}
