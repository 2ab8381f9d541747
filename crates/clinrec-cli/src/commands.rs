use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clinrec_cli::config::{ClinrecConfig, Resources};
use clinrec_cli::pipeline::{
    HydrateResult, check_code, hydrate_rows, parse_predicates, translate_code,
};
use comfy_table::Table;
use tracing::info;

use crate::cli::{CheckCodeArgs, HydrateArgs, TranslateArgs};
use crate::summary::apply_table_style;

fn load_resources(config: &Path) -> Result<Resources> {
    let config = ClinrecConfig::load(config)?;
    Resources::load(&config)
}

pub fn run_hydrate(args: &HydrateArgs) -> Result<HydrateResult> {
    let resources = load_resources(&args.config.config)?;
    let predicates = parse_predicates(&args.predicates)?;
    let result = hydrate_rows(&resources, &args.rows, &args.record_type, &predicates)?;

    let documents = serde_json::to_string_pretty(&result.documents_json()?)
        .context("serialize documents")?;
    match &args.output {
        Some(path) => {
            fs::write(path, documents).with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "documents written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{documents}").context("write documents")?;
        }
    }
    Ok(result)
}

pub fn run_check_code(args: &CheckCodeArgs) -> Result<bool> {
    let resources = load_resources(&args.config.config)?;
    let result = check_code(&resources, &args.vocabulary, &args.code)?;
    let mut table = Table::new();
    table.set_header(vec!["Vocabulary", "Code", "Valid", "Matched in", "Message"]);
    apply_table_style(&mut table);
    table.add_row(vec![
        args.vocabulary.clone(),
        args.code.clone(),
        if result.valid { "yes" } else { "no" }.to_string(),
        result.matched_in.clone().unwrap_or_else(|| "-".to_string()),
        result.message.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    println!("{table}");
    Ok(result.valid)
}

pub fn run_translate(args: &TranslateArgs) -> Result<()> {
    let resources = load_resources(&args.config.config)?;
    let Some(result) = translate_code(&resources, &args.vocabulary, &args.code, args.bare)? else {
        println!("{}: no translation into {}", args.code, args.vocabulary);
        return Ok(());
    };
    let mut table = Table::new();
    table.set_header(vec!["Table", "Target", "Display", "Equivalence", "Wildcard"]);
    apply_table_style(&mut table);
    let target = match &result.target_system {
        Some(system) => format!("{system}|{}", result.target_code),
        None => result.target_code.clone(),
    };
    table.add_row(vec![
        result.table.clone(),
        target,
        result.target_display.clone().unwrap_or_else(|| "-".to_string()),
        format!("{:?}", result.equivalence).to_lowercase(),
        if result.wildcard { "yes" } else { "no" }.to_string(),
    ]);
    println!("{table}");
    Ok(())
}
