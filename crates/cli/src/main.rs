//! CLI tool for generating one slide deck per spreadsheet row.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use deckmerge_core::{
    ContainerFormat, MergeEngine, Session, Severity, StatusLine, TagSet, ValidationReport,
    DEFAULT_FILE_PREFIX, DEFAULT_OUTPUT_DIR,
};
use deckmerge_pptx::PptxDocument;
use deckmerge_xlsx::XlsxReader;
use serde::Serialize;
use std::path::{Path, PathBuf};

const INSTRUCTIONS: &str = "\
How to use deckmerge

1. You need two input files: a PowerPoint template (.pptx) and an Excel
   data source (.xlsx).

2. In the template, write the name of each column of the Excel sheet
   between double braces where its value should appear:

       {{EXCEL_COLUMN_NAME}}

   Every placeholder is replaced with the value of that column, producing
   one presentation per row of the sheet.

3. Column names should preferably be in UPPERCASE and must never contain
   spaces; join several words with underscores: BIRTH_PLACE.
";

/// Fill a PowerPoint template with every row of an Excel sheet.
#[derive(Parser, Debug)]
#[command(name = "deckmerge")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the placeholders found in a template
    Scan {
        /// PowerPoint template (.pptx)
        template: PathBuf,
    },

    /// List the columns and row count of a data source
    Columns {
        /// Excel data source (.xlsx)
        data: PathBuf,
    },

    /// Compare the template's placeholders with the data source's columns
    Validate {
        /// PowerPoint template (.pptx)
        template: PathBuf,
        /// Excel data source (.xlsx)
        data: PathBuf,
    },

    /// Write one filled-in copy of the template per data row
    Generate {
        /// PowerPoint template (.pptx)
        template: PathBuf,
        /// Excel data source (.xlsx)
        data: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// File name prefix for generated documents
        #[arg(short, long, default_value = DEFAULT_FILE_PREFIX)]
        prefix: String,
    },

    /// Show how to prepare a template and a data source
    Instructions,
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    template: &'a Path,
    tags: &'a TagSet,
}

#[derive(Serialize)]
struct ColumnsOutput<'a> {
    data: &'a Path,
    columns: &'a [String],
    rows: usize,
}

#[derive(Serialize)]
struct ValidateOutput<'a> {
    validation: Option<&'a ValidationReport>,
    status: Option<StatusLine>,
    missing_tags: Vec<&'a str>,
}

#[derive(Serialize)]
struct GenerateOutput<'a> {
    validation: Option<&'a ValidationReport>,
    files: &'a [PathBuf],
    status: &'a StatusLine,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }
    log::debug!("Command: {:?}", args.command);

    match &args.command {
        Command::Scan { template } => scan(template, args.json),
        Command::Columns { data } => columns(data, args.json),
        Command::Validate { template, data } => validate(template, data, args.json),
        Command::Generate {
            template,
            data,
            output,
            prefix,
        } => generate(template, data, output, prefix, args.json),
        Command::Instructions => {
            print!("{}", INSTRUCTIONS);
            Ok(())
        }
    }
}

fn scan(template: &Path, json: bool) -> Result<()> {
    let mut session = Session::<PptxDocument>::new();
    let tags = load_template(&mut session, template)?;

    if json {
        print_json(&ScanOutput { template, tags })
    } else {
        println!("Tags detected in the template: {}", join_or_none(tags.iter()));
        Ok(())
    }
}

fn columns(data: &Path, json: bool) -> Result<()> {
    let mut session = Session::<PptxDocument>::new();
    load_data_source(&mut session, data)?;
    let (columns, rows) = match session.data_source() {
        Some(source) => (source.columns(), source.rows().len()),
        None => bail!("No data source loaded from {}", data.display()),
    };

    if json {
        print_json(&ColumnsOutput {
            data,
            columns,
            rows,
        })
    } else {
        println!(
            "Columns in the data source: {}",
            join_or_none(columns.iter().map(String::as_str))
        );
        println!("Rows: {}", rows);
        Ok(())
    }
}

fn validate(template: &Path, data: &Path, json: bool) -> Result<()> {
    let session = load_session(template, data)?;
    let validation = session.validation();
    let status = validation.map(StatusLine::from);
    let missing_tags = match (session.tags(), session.columns()) {
        (Some(tags), Some(columns)) => tags.missing_from(columns),
        _ => Vec::new(),
    };

    if json {
        print_json(&ValidateOutput {
            validation,
            status,
            missing_tags,
        })
    } else {
        if let Some(status) = &status {
            print_status(status);
        }
        if !missing_tags.is_empty() {
            let placeholders: Vec<String> = missing_tags
                .iter()
                .map(|tag| format!("{{{{{}}}}}", tag))
                .collect();
            println!(
                "Placeholders without a matching column: {}",
                placeholders.join(", ")
            );
        }
        Ok(())
    }
}

fn generate(
    template: &Path,
    data: &Path,
    output: &Path,
    prefix: &str,
    json: bool,
) -> Result<()> {
    let session = load_session(template, data)?;
    let validation = session.validation();
    if !json {
        if let Some(report) = validation {
            print_status(&StatusLine::from(report));
        }
    }

    if let Some(loaded) = session.template() {
        log::debug!(
            "Merging {} into {} with prefix '{}'",
            loaded.path.display(),
            output.display(),
            prefix
        );
    }

    let engine = MergeEngine::new().with_file_prefix(prefix);
    let (result, status) = session.generate_with_status(&engine, output);
    let files: &[PathBuf] = match &result {
        Ok(files) => files.as_slice(),
        Err(_) => &[],
    };

    if json {
        print_json(&GenerateOutput {
            validation,
            files,
            status: &status,
        })?;
    } else if result.is_ok() {
        for file in files {
            println!("{}", file.display());
        }
        print_status(&status);
    }

    // Failures are reported once, through the returned error.
    result.map(|_| ()).context("Generation aborted")
}

fn load_session(template: &Path, data: &Path) -> Result<Session<PptxDocument>> {
    let mut session = Session::new();
    load_template(&mut session, template)?;
    load_data_source(&mut session, data)?;
    Ok(session)
}

fn load_template<'s>(
    session: &'s mut Session<PptxDocument>,
    path: &Path,
) -> Result<&'s TagSet> {
    expect_format(path, ContainerFormat::Pptx)?;
    session
        .load_template(path)
        .with_context(|| format!("Failed to load template {}", path.display()))
}

fn load_data_source(session: &mut Session<PptxDocument>, path: &Path) -> Result<()> {
    expect_format(path, ContainerFormat::Xlsx)?;
    let source = XlsxReader::new()
        .open(path)
        .with_context(|| format!("Failed to load data source {}", path.display()))?;
    session.load_data_source(source);
    Ok(())
}

/// Reject inputs whose extension names a different container.
fn expect_format(path: &Path, expected: ContainerFormat) -> Result<()> {
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ContainerFormat::from_extension);

    if format != Some(expected) {
        bail!(
            "{} is not a .{} file",
            path.display(),
            expected.extension()
        );
    }
    log::debug!("Loading {} as {:?}", path.display(), expected);
    Ok(())
}

fn print_status(status: &StatusLine) {
    match status.severity {
        Severity::Error => eprintln!("{}", status),
        Severity::Normal | Severity::Success => println!("{}", status),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let items: Vec<&str> = items.collect();
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
