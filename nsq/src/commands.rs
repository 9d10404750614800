//! CLI command implementations.

use std::io::{self, Read, Write};
use std::path::Path;

use nodesel::{
    compile_query, compress_hostnames, expand_pattern, split_multi_pattern, Config, FieldName,
    HostFilter, Record, Vocabulary,
};
use serde_json::Value;

use crate::{GlobalOptions, OutputFormat};

/// Build the vocabulary from the resolved config and command-line overrides.
fn vocabulary(global: &GlobalOptions) -> nodesel::Result<Vocabulary> {
    let mut config = Config::load(global.config.as_deref())?;
    if global.no_catalog {
        config.catalog = false;
    }
    config.vocabulary()
}

/// Read all of `file`, or stdin if none.
fn read_input(file: Option<&Path>) -> nodesel::Result<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Parse records given either as one JSON array or as JSON Lines.
fn parse_records(text: &str) -> nodesel::Result<Vec<Value>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    let mut records = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str(line)?);
    }
    Ok(records)
}

pub fn select(
    global: &GlobalOptions,
    query: &str,
    file: Option<&Path>,
    format: OutputFormat,
) -> nodesel::Result<()> {
    let vocab = vocabulary(global)?;
    let expr = compile_query(query, &vocab)?;
    let records = parse_records(&read_input(file)?)?;
    let selected = expr.select(&records);
    tracing::info!(rows = records.len(), selected = selected.count(), "selected");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            let rows: Vec<&Value> = selected.iter().map(|n| &records[n]).collect();
            serde_json::to_writer_pretty(&mut out, &rows)?;
            writeln!(out)?;
        }
        OutputFormat::Hosts => {
            for n in &selected {
                if let Some(host) = records[n].hostname() {
                    writeln!(out, "{}", host)?;
                }
            }
        }
        OutputFormat::Indices => {
            for n in &selected {
                writeln!(out, "{}", n)?;
            }
        }
        OutputFormat::Bits => {
            let bits: String = selected
                .to_array()
                .iter()
                .map(|b| if *b == 1 { '1' } else { '0' })
                .collect();
            writeln!(out, "{}", bits)?;
        }
    }
    Ok(())
}

pub fn check(global: &GlobalOptions, query: &str) -> nodesel::Result<()> {
    let vocab = vocabulary(global)?;
    let expr = compile_query(query, &vocab)?;
    println!("{}", expr);
    Ok(())
}

pub fn split(patterns: &str) -> nodesel::Result<()> {
    for pattern in split_multi_pattern(patterns)? {
        println!("{}", pattern);
    }
    Ok(())
}

/// Print the host names matched by `patterns`; returns whether any matched.
pub fn match_hosts(patterns: &str, hostnames: &[String], prefix: bool) -> nodesel::Result<bool> {
    let mut filter = HostFilter::new(prefix);
    filter.insert_multi(patterns)?;
    let mut any = false;
    for hostname in hostnames.iter().filter(|h| filter.is_match(h)) {
        println!("{}", hostname);
        any = true;
    }
    Ok(any)
}

pub fn expand(patterns: &str) -> nodesel::Result<()> {
    for pattern in split_multi_pattern(patterns)? {
        for hostname in expand_pattern(&pattern)? {
            println!("{}", hostname);
        }
    }
    Ok(())
}

pub fn compress(file: Option<&Path>) -> nodesel::Result<()> {
    let text = read_input(file)?;
    let hosts: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let patterns = compress_hostnames(&hosts);
    if !patterns.is_empty() {
        println!("{}", patterns.join(","));
    }
    Ok(())
}

pub fn fields(global: &GlobalOptions) -> nodesel::Result<()> {
    let vocab = vocabulary(global)?;

    if vocab.is_empty() {
        println!("No fields or operations defined");
        return Ok(());
    }

    println!("Fields:");
    for (name, entry) in vocab.fields() {
        match entry {
            FieldName::Canonical => println!("  {}", name),
            FieldName::Alias(target) => match vocab.resolve_field(name) {
                Some(field) if field != target.as_str() => {
                    println!("  {} -> {} ({})", name, target, field)
                }
                _ => println!("  {} -> {}", name, target),
            },
        }
    }

    println!("\nOperations:");
    for (name, expr) in vocab.operations() {
        println!("  {:<14} {}", name, expr);
    }
    Ok(())
}
