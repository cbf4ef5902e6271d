//! Standalone HTML rendering of an [`Antibiogram`].
//!
//! Output is buffered into a single `String`, so nothing is written unless the whole page
//! rendered.
use super::{Antibiogram, GroupMatrix, SampleTypeSection};
use crate::{
    bands::Band,
    matrix::{cell_text, Matrix},
};
use html_escape::{encode_double_quoted_attribute_to_string, encode_text_to_string};
use std::fmt::Write;

const NOT_TESTED_COLOUR: &str = "#d9d9d9";

const STYLE: &str = r#"
body { background-color: #f4f6f9; font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; color: #333; margin: 0; }
.container { max-width: 1200px; margin: 0 auto; padding: 0 1rem; }
.header { background-color: white; padding: 2rem 0; margin-bottom: 2rem; border-bottom: 5px solid #26c6da; text-align: center; }
h1, h2, h3 { color: #1f3a60; }
.stats { display: flex; gap: 1rem; margin-bottom: 2rem; }
.stat-box { flex: 1; text-align: center; padding: 1.5rem; background: white; border-radius: 8px; border: 1px solid #eee; }
.stat-value { font-size: 2.5rem; font-weight: bold; color: #1f3a60; }
.stat-label { color: #26c6da; font-size: 0.85rem; text-transform: uppercase; letter-spacing: 1px; font-weight: 700; }
.note { background: white; border-left: 5px solid #1f3a60; padding: 1rem 1.5rem; margin-bottom: 2rem; }
.card { background: white; border-radius: 8px; margin-bottom: 2rem; overflow-x: auto; }
.card-header { background-color: #1f3a60; color: white; font-weight: 600; font-size: 1.25rem; padding: 1rem 1.5rem; }
.card-body { padding: 1rem 1.5rem; }
.badge { background-color: #26c6da; color: #1f3a60; border-radius: 4px; padding: 0 0.5rem; font-size: 0.9rem; }
.placeholder { color: #6c757d; text-align: center; }
table.heatmap { border-collapse: separate; border-spacing: 1px; font-size: 0.85rem; }
table.heatmap th { font-weight: 600; padding: 0.25rem 0.5rem; }
table.heatmap thead th { writing-mode: vertical-rl; transform: rotate(180deg); vertical-align: bottom; }
table.heatmap tbody th { text-align: left; white-space: nowrap; }
table.heatmap td { min-width: 2.5rem; text-align: center; padding: 0.25rem; }
td.not-tested { color: #777; font-size: 0.7rem; }
.low-count { color: #b02a37; }
.legend span { display: inline-block; padding: 0.1rem 0.6rem; margin-right: 0.5rem; border-radius: 4px; }
.footer { text-align: center; padding: 3rem 0; color: #6c757d; font-size: 0.9rem; border-top: 1px solid #eee; background-color: white; margin-top: 3rem; }
"#;

pub(super) fn render(report: &Antibiogram) -> String {
    let mut output = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n<title>");
    encode_text_to_string(&report.title, &mut output);
    output.push_str("</title>\n<style>");
    output.push_str(STYLE);
    output.push_str("</style>\n</head>\n<body>\n");

    write_header(report, &mut output);
    output.push_str("<div class=\"container\">\n");
    write_summary(report, &mut output);
    write_methodology(report, &mut output);

    for group in &report.overview {
        output.push_str("<div class=\"card\">\n<div class=\"card-header\">");
        encode_text_to_string(group.group.label(), &mut output);
        output.push_str("</div>\n<div class=\"card-body\">\n");
        write_group(group, report.low_count_threshold, &mut output);
        output.push_str("</div>\n</div>\n");
    }

    output.push_str("<h2>Stratification by Specimen Type</h2>\n");
    if report.sample_types.is_empty() {
        output.push_str("<p class=\"placeholder\">No Specimen Type Data</p>\n");
    }
    for section in &report.sample_types {
        write_sample_type(section, report.low_count_threshold, &mut output);
    }

    output.push_str("</div>\n<div class=\"footer\">\n");
    if let Some(institution) = &report.institution {
        output.push_str("<p>&copy; ");
        encode_text_to_string(institution, &mut output);
        output.push_str("</p>\n");
    }
    output.push_str("</div>\n</body>\n</html>\n");
    output
}

fn write_header(report: &Antibiogram, output: &mut String) {
    output.push_str("<div class=\"header\">\n");
    if let Some(institution) = &report.institution {
        output.push_str("<h1>");
        encode_text_to_string(institution, output);
        output.push_str("</h1>\n");
    }
    output.push_str("<h2>");
    encode_text_to_string(&report.title, output);
    output.push_str("</h2>\n");
    let _ = write!(
        output,
        "<small>Generated: {}</small>\n</div>\n",
        report.generated.format("%Y-%m-%d %H:%M")
    );
}

fn write_summary(report: &Antibiogram, output: &mut String) {
    output.push_str("<div class=\"stats\">\n");
    for (label, value) in report.summary.scalars() {
        output.push_str("<div class=\"stat-box\"><div class=\"stat-value\">");
        encode_text_to_string(&value, output);
        output.push_str("</div><div class=\"stat-label\">");
        encode_text_to_string(label, output);
        output.push_str("</div></div>\n");
    }
    output.push_str("</div>\n");

    output.push_str("<p class=\"legend\">");
    for (band, count) in report.summary.bands.iter() {
        let _ = write!(output, "<span style=\"background-color:{}\">", band.colour);
        encode_text_to_string(format!("{}: {}", band, count), output);
        output.push_str("</span>");
    }
    let _ = write!(
        output,
        "<span style=\"background-color:{}\">Not Tested</span></p>\n",
        NOT_TESTED_COLOUR
    );
}

fn write_methodology(report: &Antibiogram, output: &mut String) {
    output.push_str("<div class=\"note\">\n<strong>Methodology:</strong><br>\n");
    output.push_str(
        "Data follows CLSI M39 guidelines. Only the first isolate per patient per species is \
         included.<br>\nValues represent the percentage of isolates susceptible to the \
         antibiotic. Intermediate and resistant results count as tested but not \
         susceptible.<br>\n",
    );
    let _ = write!(
        output,
        "Organisms marked <span class=\"low-count\">*</span> have fewer than {} isolates \
         tested and should be interpreted with caution.\n",
        report.low_count_threshold
    );
    if report.join.unmatched > 0 {
        let _ = write!(
            output,
            "<br>{} of {} AST results had no matching first isolate and were not counted.\n",
            report.join.unmatched, report.join.results
        );
    }
    output.push_str("</div>\n");
}

fn write_sample_type(section: &SampleTypeSection, threshold: usize, output: &mut String) {
    output.push_str("<div class=\"card\">\n<div class=\"card-header\">Specimen Analysis: ");
    encode_text_to_string(&section.sample_type, output);
    let _ = write!(
        output,
        " <span class=\"badge\">{} Isolates</span></div>\n<div class=\"card-body\">\n",
        section.isolates
    );
    for (idx, group) in section.groups.iter().enumerate() {
        if idx > 0 {
            output.push_str("<hr>\n");
        }
        write_group(group, threshold, output);
    }
    output.push_str("</div>\n</div>\n");
}

fn write_group(group: &GroupMatrix, threshold: usize, output: &mut String) {
    if group.matrix.is_empty() {
        let _ = writeln!(
            output,
            "<p class=\"placeholder\">No {} Data</p>",
            group.group
        );
    } else {
        write_matrix(&group.matrix, threshold, output);
    }
}

/// One heatmap table. Absent cells are grey and say "Not Tested", never 0%.
fn write_matrix(matrix: &Matrix, threshold: usize, output: &mut String) {
    output.push_str("<table class=\"heatmap\">\n<thead><tr><th>Organism</th>");
    for antibiotic in matrix.columns() {
        output.push_str("<th>");
        encode_text_to_string(antibiotic, output);
        output.push_str("</th>");
    }
    output.push_str("</tr></thead>\n<tbody>\n");

    for row in matrix.rows() {
        output.push_str("<tr><th scope=\"row\">");
        encode_text_to_string(&row.label, output);
        if row.total_isolates < threshold {
            output.push_str(" <span class=\"low-count\">*</span>");
        }
        output.push_str("</th>");
        for col in 0..matrix.columns().len() {
            match row.cell(col) {
                Some((pct, tested)) => {
                    let band = Band::classify(pct);
                    let _ = write!(
                        output,
                        "<td style=\"background-color:{}\" title=\"",
                        band.colour
                    );
                    encode_double_quoted_attribute_to_string(
                        cell_text(Some((pct, tested))),
                        output,
                    );
                    let _ = write!(output, "\">{:.0}</td>", pct);
                }
                None => {
                    let _ = write!(
                        output,
                        "<td class=\"not-tested\" style=\"background-color:{}\" \
                         title=\"Not Tested\">NT</td>",
                        NOT_TESTED_COLOUR
                    );
                }
            }
        }
        output.push_str("</tr>\n");
    }
    output.push_str("</tbody>\n</table>\n");
}

#[cfg(test)]
mod test {
    use super::render;
    use crate::{
        bands::BandCounts,
        config::ReportConfig,
        matrix::Matrix,
        report::{Antibiogram, GroupMatrix, SampleTypeSection},
        summary::Summary,
        susceptibility::{JoinStats, SusceptibilityRow},
        taxonomy::OrganismGroup,
    };
    use chrono::NaiveDate;

    fn row(
        organism: &str,
        antibiotic: &str,
        tested: usize,
        susceptible: usize,
    ) -> SusceptibilityRow {
        SusceptibilityRow {
            organism: organism.into(),
            antibiotic: antibiotic.into(),
            group: OrganismGroup::classify(organism),
            isolates_tested: tested,
            susceptible,
            percent_susceptible: susceptible as f64 / tested as f64 * 100.,
            total_isolates_of_organism: tested,
        }
    }

    fn report(overview: Vec<GroupMatrix>, sample_types: Vec<SampleTypeSection>) -> Antibiogram {
        let config = ReportConfig::default();
        Antibiogram {
            title: config.title,
            institution: Some("St. Mary's <General>".into()),
            generated: NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            summary: Summary {
                unique_isolates: 3,
                organisms: 2,
                mean_percent_susceptible: Some(62.5),
                antibiotics: 2,
                bands: BandCounts::bucket_values([100., 25.]),
            },
            overview,
            sample_types,
            skipped: vec![],
            join: JoinStats::default(),
            low_count_threshold: config.low_count_threshold,
        }
    }

    #[test]
    fn heatmap() {
        let rows = vec![
            row("Escherichia coli", "Ampicillin", 40, 10),
            row("Klebsiella pneumoniae", "Meropenem", 2, 2),
        ];
        let gn = GroupMatrix {
            group: OrganismGroup::GramNegative,
            matrix: Matrix::build(&rows).unwrap(),
        };
        let html = render(&report(vec![gn], vec![]));
        assert!(html.contains("title=\"25.0% Susceptible\nTested: 40\">25</td>"));
        assert!(html.contains("title=\"Not Tested\">NT</td>"));
        // only the Klebsiella row is under the threshold
        assert_eq!(html.matches("<span class=\"low-count\">*</span></th>").count(), 1);
        assert!(html.contains("Klebsiella pneumoniae (n=2) <span class=\"low-count\">"));
        assert!(html.contains("<div class=\"stat-value\">62%</div>"));
        assert!(html.contains("Generated: 2024-02-01 09:30"));
    }

    #[test]
    fn placeholders() {
        let empty = |group| GroupMatrix {
            group,
            matrix: Matrix::default(),
        };
        let html = render(&report(
            vec![empty(OrganismGroup::GramNegative), empty(OrganismGroup::Fungal)],
            vec![],
        ));
        assert!(html.contains("No Gram-Negative Data"));
        assert!(html.contains("No Fungal Data"));
        assert!(html.contains("No Specimen Type Data"));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn escaped() {
        let rows = vec![row("<script>alert(1)</script>", "Amp & Sul", 40, 40)];
        let other = GroupMatrix {
            group: OrganismGroup::Other,
            matrix: Matrix::build(&rows).unwrap(),
        };
        let section = SampleTypeSection {
            sample_type: "Pus <deep>".into(),
            isolates: 1,
            groups: vec![other.clone()],
        };
        let html = render(&report(vec![other], vec![section]));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; (n=40)"));
        assert!(html.contains("Amp &amp; Sul"));
        assert!(html.contains("Specimen Analysis: Pus &lt;deep&gt;"));
        assert!(html.contains("St. Mary's &lt;General&gt;"));
    }
}
