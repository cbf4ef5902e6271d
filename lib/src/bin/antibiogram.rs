use antibiogram::{header, AstResults, Antibiogram, Config, Isolates, ResultExt};
use clap::Parser;
use qu::ick_use::*;
use std::path::PathBuf;
use term_data_table::{Cell, Row, Table};

#[derive(Parser)]
struct Opt {
    /// The TOML config file. Defaults to `antibiogram.toml` if it exists.
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Override the isolates table path from the config
    #[clap(long)]
    isolates: Option<PathBuf>,
    /// Override the AST results table path from the config
    #[clap(long)]
    ast: Option<PathBuf>,
    /// Override the output directory from the config
    #[clap(short, long)]
    output_dir: Option<PathBuf>,
    /// Also save the deduplicated isolates as CSV to the given path
    #[clap(long)]
    export_unique_isolates: Option<PathBuf>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let mut config = Config::load_or_default(opt.config.as_deref())?;
    if let Some(path) = opt.isolates {
        config.isolates.path = path;
    }
    if let Some(path) = opt.ast {
        config.ast.path = path;
    }
    if let Some(dir) = opt.output_dir {
        config.report.output_dir = dir;
    }

    let isolates = Isolates::load(&config.isolates).print_error()?;
    let ast = AstResults::load(&config.ast).print_error()?;
    let unique = isolates.first_isolates();
    if let Some(path) = &opt.export_unique_isolates {
        unique.save_csv(path)?;
    }

    let report = Antibiogram::build(&unique, &ast, &config.report).print_error()?;
    if report.is_empty() {
        event!(
            Level::WARN,
            "no AST results matched a first isolate, the report will be empty"
        );
    }

    header("Data");
    println!("total isolates: {}", isolates.len());
    println!("first isolates: {}", unique.len());
    println!("AST results: {}", ast.len());
    println!(
        "AST results without a first isolate: {}",
        report.join.unmatched
    );

    header("Summary");
    println!("{}", report.summary.term_table());

    header("Susceptibility bands");
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Band"))
            .with_cell(Cell::from("Pairs")),
    );
    for (band, count) in report.summary.bands.iter() {
        table.add_row(
            Row::new()
                .with_cell(Cell::from(band.to_string()))
                .with_cell(Cell::from(count.to_string())),
        );
    }
    println!("{}", table);

    header("Sample types");
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Sample type"))
            .with_cell(Cell::from("Isolates"))
            .with_cell(Cell::from("Organisms"))
            .with_cell(Cell::from("Antibiotics")),
    );
    for section in &report.sample_types {
        let organisms: usize = section.groups.iter().map(|g| g.matrix.rows().len()).sum();
        let antibiotics: usize = section.groups.iter().map(|g| g.matrix.columns().len()).sum();
        table.add_row(
            Row::new()
                .with_cell(Cell::from(section.sample_type.to_string()))
                .with_cell(Cell::from(section.isolates.to_string()))
                .with_cell(Cell::from(organisms.to_string()))
                .with_cell(Cell::from(antibiotics.to_string())),
        );
    }
    println!("{}", table);

    let html = config.report.html_path();
    report.save_html(&html)?;
    let json = config.report.json_path();
    report.save_json(&json)?;
    event!(
        Level::INFO,
        "report saved to \"{}\" and \"{}\"",
        html.display(),
        json.display()
    );
    Ok(())
}
