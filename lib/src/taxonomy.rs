//! Fixed organism groupings used to split the antibiogram.
//!
//! Names are matched exactly, including case and the spellings used by the laboratory system
//! (e.g. `Acinetobacter Baumanni`), so an organism missing from every list lands in `Other`
//! rather than being guessed at.
use once_cell::sync::Lazy;
use serde::Serialize;
use std::{collections::HashSet, fmt};

const GRAM_NEGATIVE: &[&str] = &[
    "Escherichia coli",
    "Klebsiella pneumoniae",
    "Pseudomonas aeruginosa",
    "Proteus mirabilis",
    "Klebsiella aerogenes",
    "Enterobacter cloacae",
    "Citrobacter freundii",
    "Acinetobacter Baumanni",
    "Morganella morgani",
    "Salmonella Species",
    "Shigella Species",
    "Neisseria gonorrhoeae",
    "Haemophilus influenzae",
    "Burkholderia cepacia",
    "Stenotrophomonas maltophilia",
    "Serratia marcescens",
    "Escherichia coli O157",
];

const GRAM_POSITIVE: &[&str] = &[
    "Staphylococcus aureus",
    "Staphylococcus epidermidis",
    "Staphylococcus saprophyticus",
    "Staphylococcus hemolyticus",
    "Enterococcus faecalis",
    "Enterococcus faecium",
    "Streptococcus pneumoniae",
    "Streptococcus pyogenes",
    "Streptococcus agalactiae",
    "Streptococcus viridians",
    "Coagulase negative Staphylococcus",
    "Listeria monocytogenes",
    "Staphylococcus lentus",
    "Staphylococcus sciuri",
    "Aerococcus viridans",
    "Micrococcus species",
    "Bacillus Species",
];

const FUNGI: &[&str] = &[
    "Candida albicans",
    "Candida glabrata",
    "Candida tropicalis",
    "Candida parapsilosis",
    "Candida krusei",
    "Candida auris",
    "Cryptococcus neoformans",
    "Candida guillermondii",
    "Candida dubliniensis",
    "Cryptococcus laurentii",
    "Candida Lusitaniae",
    "Trichosporon asahii",
];

/// Agents that may appear in the fungal antibiogram. Antibacterials reported against a yeast
/// are data-entry noise.
const ANTIFUNGALS: &[&str] = &[
    "Fluconazole",
    "Voriconazole",
    "Caspofungin",
    "Micafungin",
    "Flucytosine",
    "Amphotericin B",
    "Itraconazole",
    "Posaconazole",
    "Anidulafungin",
];

static GRAM_NEGATIVE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| GRAM_NEGATIVE.iter().copied().collect());
static GRAM_POSITIVE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| GRAM_POSITIVE.iter().copied().collect());
static FUNGI_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| FUNGI.iter().copied().collect());
static ANTIFUNGAL_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ANTIFUNGALS.iter().copied().collect());

/// The section of the antibiogram an organism belongs to.
///
/// Ordering is the order sections appear in the report.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub enum OrganismGroup {
    #[serde(rename = "Gram-Negative")]
    GramNegative,
    #[serde(rename = "Gram-Positive")]
    GramPositive,
    #[serde(rename = "Fungi")]
    Fungal,
    Other,
}

impl OrganismGroup {
    pub const ALL: [OrganismGroup; 4] = [
        OrganismGroup::GramNegative,
        OrganismGroup::GramPositive,
        OrganismGroup::Fungal,
        OrganismGroup::Other,
    ];

    /// Classify an organism by its exact name.
    pub fn classify(organism: &str) -> Self {
        if GRAM_NEGATIVE_SET.contains(organism) {
            OrganismGroup::GramNegative
        } else if GRAM_POSITIVE_SET.contains(organism) {
            OrganismGroup::GramPositive
        } else if FUNGI_SET.contains(organism) {
            OrganismGroup::Fungal
        } else {
            OrganismGroup::Other
        }
    }

    /// Whether results for `agent` belong in this group's antibiogram.
    ///
    /// Only the fungal group restricts its agents.
    pub fn reports_agent(self, agent: &str) -> bool {
        match self {
            OrganismGroup::Fungal => is_antifungal(agent),
            _ => true,
        }
    }

    /// A human-readable label for the group.
    pub fn label(self) -> &'static str {
        match self {
            OrganismGroup::GramNegative => "Gram-Negative Bacteria",
            OrganismGroup::GramPositive => "Gram-Positive Bacteria",
            OrganismGroup::Fungal => "Fungi & Yeasts (Antifungals Only)",
            OrganismGroup::Other => "Other Organisms",
        }
    }
}

impl fmt::Display for OrganismGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            OrganismGroup::GramNegative => "Gram-Negative",
            OrganismGroup::GramPositive => "Gram-Positive",
            OrganismGroup::Fungal => "Fungal",
            OrganismGroup::Other => "Other",
        })
    }
}

pub fn is_antifungal(agent: &str) -> bool {
    ANTIFUNGAL_SET.contains(agent)
}

#[cfg(test)]
mod test {
    use super::{is_antifungal, OrganismGroup, FUNGI, GRAM_NEGATIVE, GRAM_POSITIVE};
    use std::collections::HashSet;

    #[test]
    fn classify() {
        assert_eq!(
            OrganismGroup::classify("Escherichia coli"),
            OrganismGroup::GramNegative
        );
        assert_eq!(
            OrganismGroup::classify("Enterococcus faecalis"),
            OrganismGroup::GramPositive
        );
        assert_eq!(
            OrganismGroup::classify("Candida auris"),
            OrganismGroup::Fungal
        );
        assert_eq!(OrganismGroup::classify("Mixed growth"), OrganismGroup::Other);
    }

    #[test]
    fn exact_match_only() {
        assert_eq!(
            OrganismGroup::classify("escherichia coli"),
            OrganismGroup::Other
        );
        assert_eq!(
            OrganismGroup::classify("Escherichia coli "),
            OrganismGroup::Other
        );
    }

    #[test]
    fn lists_disjoint() {
        let neg: HashSet<_> = GRAM_NEGATIVE.iter().collect();
        let pos: HashSet<_> = GRAM_POSITIVE.iter().collect();
        let fungi: HashSet<_> = FUNGI.iter().collect();
        assert!(neg.is_disjoint(&pos));
        assert!(neg.is_disjoint(&fungi));
        assert!(pos.is_disjoint(&fungi));
    }

    #[test]
    fn fungal_agents() {
        assert!(is_antifungal("Fluconazole"));
        assert!(!is_antifungal("Ampicillin"));
        assert!(OrganismGroup::Fungal.reports_agent("Amphotericin B"));
        assert!(!OrganismGroup::Fungal.reports_agent("Ciprofloxacin"));
        assert!(OrganismGroup::GramNegative.reports_agent("Ciprofloxacin"));
    }
}
