use antibiogram::{
    header, susceptibility, AstResults, Config, Isolates, OrganismGroup, ResultExt,
};
use clap::Parser;
use qu::ick_use::*;
use std::{collections::BTreeMap, path::PathBuf};
use term_data_table::{Cell, Row, Table};

#[derive(Parser)]
struct Opt {
    /// The TOML config file. Defaults to `antibiogram.toml` if it exists.
    #[clap(short, long)]
    config: Option<PathBuf>,
    #[clap(long)]
    isolates: Option<PathBuf>,
    #[clap(long)]
    ast: Option<PathBuf>,
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

    let isolates = Isolates::load(&config.isolates).print_error()?;
    let ast = AstResults::load(&config.ast).print_error()?;
    let unique = isolates.first_isolates();
    let (_, join) = susceptibility::join(&unique, &ast);

    header("Data stats");
    let isolates_len = isolates.len();
    println!("total isolates: {}", isolates_len);
    println!("first isolates: {}", unique.len());
    println!("isolates without a usable timestamp: {}", isolates.undated());
    println!(
        "isolates with a blank specimen: {}",
        isolates.blank_specimens()
    );
    println!("total AST results: {}", ast.len());
    println!(
        "AST results with a blank specimen: {}",
        ast.iter().filter(|res| res.specimen.is_blank()).count()
    );
    println!(
        "AST results without a first isolate: {}",
        join.unmatched
    );
    if let Some(date) = isolates.iter().filter_map(|iso| iso.created_on).min() {
        println!("earliest isolate: {}", date);
    }
    if let Some(date) = isolates.iter().filter_map(|iso| iso.created_on).max() {
        println!("latest isolate: {}", date);
    }

    header("Interpretations");
    let ast_len = ast.len();
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Interpretation"))
            .with_cell(Cell::from("Count"))
            .with_cell(Cell::from("Percentage")),
    );
    for (interpretation, count) in ast.count_interpretations() {
        table.add_row(
            Row::new()
                .with_cell(Cell::from(format!("{:?}", interpretation.as_str())))
                .with_cell(Cell::from(count.to_string()))
                .with_cell(Cell::from(format!(
                    "{:.1}%",
                    count as f64 / ast_len.max(1) as f64 * 100.
                ))),
        );
    }
    println!("{}", table);

    header("Organism groups");
    let mut groups: BTreeMap<OrganismGroup, usize> =
        OrganismGroup::ALL.into_iter().map(|g| (g, 0)).collect();
    let mut other: BTreeMap<&str, usize> = BTreeMap::new();
    for isolate in unique.iter() {
        let group = OrganismGroup::classify(&isolate.organism);
        *groups.entry(group).or_insert(0) += 1;
        if group == OrganismGroup::Other {
            *other.entry(&*isolate.organism).or_insert(0) += 1;
        }
    }
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Group"))
            .with_cell(Cell::from("First isolates")),
    );
    for (group, count) in groups {
        table.add_row(
            Row::new()
                .with_cell(Cell::from(group.to_string()))
                .with_cell(Cell::from(count.to_string())),
        );
    }
    println!("{}", table);

    header("Organisms classified as Other");
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Organism"))
            .with_cell(Cell::from("First isolates")),
    );
    for (organism, count) in other {
        table.add_row(
            Row::new()
                .with_cell(Cell::from(format!("{:?}", organism)))
                .with_cell(Cell::from(count.to_string())),
        );
    }
    println!("{}", table);

    header("Sample types");
    let unique_len = unique.len();
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Sample type"))
            .with_cell(Cell::from("First isolates"))
            .with_cell(Cell::from("Percentage")),
    );
    for (sample_type, count) in unique.sample_type_counts() {
        table.add_row(
            Row::new()
                .with_cell(Cell::from(sample_type.to_string()))
                .with_cell(Cell::from(count.to_string()))
                .with_cell(Cell::from(format!(
                    "{:.1}%",
                    count as f64 / unique_len.max(1) as f64 * 100.
                ))),
        );
    }
    println!("{}", table);
    Ok(())
}
