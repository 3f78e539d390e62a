//! untrack CLI - accept tracked changes in Word documents

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use untrack::accept::count_revision_elements;
use untrack::package::{list_parts, read_part};
use untrack::{
    accept_revisions, detect_input_from_path, AcceptOptions, Change, ChangeKind, InputKind,
    JsonFormat, PartSelection, PartStatus, Untrack,
};

#[derive(Parser)]
#[command(name = "untrack")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Accept tracked changes in Word documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept all tracked changes
    Accept {
        /// Input documents (.docx) or XML parts
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (single input only)
        #[arg(short, long, value_name = "FILE", conflicts_with = "out_dir")]
        output: Option<PathBuf>,

        /// Output directory
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Also clean headers, footers, footnotes and endnotes
        #[arg(long, conflicts_with = "part")]
        all_parts: bool,

        /// Package part to clean (repeatable)
        #[arg(long, value_name = "NAME")]
        part: Vec<String>,

        /// Fail if a selected part is missing
        #[arg(long)]
        strict: bool,

        /// Report revision elements found in each part
        #[arg(long)]
        warnings: bool,
    },

    /// List tracked changes
    Changes {
        /// Input document (.docx) or XML part
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON instead of prompt text
        #[arg(long)]
        json: bool,

        /// Output compact JSON
        #[arg(long, requires = "json")]
        compact: bool,

        /// Read changes from every content part
        #[arg(long)]
        all_parts: bool,
    },

    /// Accept tracked changes in a single XML part
    CleanXml {
        /// Input XML part
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Report revision elements found
        #[arg(long)]
        warnings: bool,
    },

    /// Show revision information
    Info {
        /// Input document (.docx) or XML part
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Accept {
            inputs,
            output,
            out_dir,
            all_parts,
            part,
            strict,
            warnings,
        } => {
            let parts = if all_parts {
                PartSelection::Discover
            } else if !part.is_empty() {
                PartSelection::Named(part)
            } else {
                PartSelection::MainDocument
            };
            let mut untrack = Untrack::new().with_parts(parts).with_warnings(warnings);
            if strict {
                untrack = untrack.fail_on_missing_parts();
            }
            cmd_accept(&untrack, &inputs, output.as_deref(), out_dir.as_deref())
        }
        Commands::Changes {
            input,
            json,
            compact,
            all_parts,
        } => cmd_changes(&input, json, compact, all_parts),
        Commands::CleanXml {
            input,
            output,
            warnings,
        } => cmd_clean_xml(&input, output.as_deref(), warnings),
        Commands::Info { input, json } => cmd_info(&input, json),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// `draft.docx` becomes `draft.accepted.docx`, placed in `out_dir` if given.
fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{}.accepted.{}", stem, ext.to_string_lossy()),
        None => format!("{}.accepted", stem),
    };
    match out_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn cmd_accept(
    untrack: &Untrack,
    inputs: &[PathBuf],
    output: Option<&Path>,
    out_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if output.is_some() && inputs.len() > 1 {
        return Err("--output can only be used with a single input; use --out-dir".into());
    }
    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)?;
    }

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut written = Vec::with_capacity(inputs.len());
    for input in inputs {
        pb.set_message(format!("Accepting {}...", input.display()));
        let target = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| output_path(input, out_dir));

        let result = untrack.accept_file(input, &target)?;
        for (part, warning) in result.warnings() {
            pb.suspend(|| {
                println!(
                    "{} {}: {} x{}",
                    "Warning".yellow().bold(),
                    part,
                    warning.element,
                    warning.count
                );
            });
        }
        for report in result.parts.iter().filter(|r| r.status == PartStatus::Missing) {
            log::info!("{}: part {} not found", input.display(), report.name);
        }

        written.push((target, result.cleaned_count()));
        pb.inc(1);
    }

    pb.finish_with_message("Done!");

    println!("\n{}", "Output files:".green().bold());
    let last = written.len().saturating_sub(1);
    for (i, (path, cleaned)) in written.iter().enumerate() {
        let branch = if i == last { "└─" } else { "├─" };
        println!(
            "  {} {} ({} part(s) cleaned)",
            branch.dimmed(),
            path.display(),
            cleaned
        );
    }

    Ok(())
}

fn cmd_changes(
    input: &Path,
    json: bool,
    compact: bool,
    all_parts: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let mut untrack = Untrack::new();
    if all_parts {
        untrack = untrack.discover_parts();
    }
    let changes = untrack.changes_bytes(&data)?;

    if json {
        let format = if compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        };
        println!("{}", untrack::render::to_json(&changes, format)?);
    } else if changes.is_empty() {
        println!("{}", "No tracked changes".dimmed());
    } else {
        println!("{}", untrack::render::to_prompt(&changes));
    }

    Ok(())
}

fn cmd_clean_xml(
    input: &Path,
    output: Option<&Path>,
    warnings: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if detect_input_from_path(input)? != InputKind::Xml {
        return Err(format!("{} is not an XML part", input.display()).into());
    }

    let data = fs::read(input)?;
    let result = accept_revisions(&data, &AcceptOptions::new().with_warnings(warnings))?;

    for warning in &result.warnings {
        eprintln!(
            "{} {} x{}",
            "Warning".yellow().bold(),
            warning.element,
            warning.count
        );
    }

    if let Some(path) = output {
        fs::write(path, &result.xml)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        write_xml(&mut std::io::stdout().lock(), &result.xml)?;
    }

    Ok(())
}

/// Write cleaned bytes as they are, so the part keeps its declared encoding.
fn write_xml<W: Write>(out: &mut W, xml: &[u8]) -> std::io::Result<()> {
    out.write_all(xml)?;
    out.flush()
}

/// Insertion, deletion and replacement counts.
fn change_totals(changes: &[Change]) -> (usize, usize, usize) {
    let count = |kind: ChangeKind| changes.iter().filter(|c| c.kind == kind).count();
    (
        count(ChangeKind::Insertion),
        count(ChangeKind::Deletion),
        count(ChangeKind::Paired),
    )
}

fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let kind = untrack::detect_input(&data)?;

    let mut parts = Vec::new();
    match kind {
        InputKind::Package => {
            let names = list_parts(&data)?;
            for name in PartSelection::Discover.resolve(names.iter().map(String::as_str)) {
                if let Some(xml) = read_part(&data, &name)? {
                    parts.push((name, count_revision_elements(&xml)?));
                }
            }
        }
        InputKind::Xml => {
            parts.push((
                untrack::XML_PART_NAME.to_string(),
                count_revision_elements(&data)?,
            ));
        }
    }
    let changes = Untrack::new().discover_parts().changes_bytes(&data)?;
    let (insertions, deletions, replacements) = change_totals(&changes);

    if json {
        let summary = serde_json::json!({
            "file": input.display().to_string(),
            "kind": kind.to_string(),
            "parts": parts
                .iter()
                .map(|(name, counts)| serde_json::json!({ "name": name, "revisions": counts }))
                .collect::<Vec<_>>(),
            "insertions": insertions,
            "deletions": deletions,
            "replacements": replacements,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), kind);
    println!("{}: {}", "Content parts".bold(), parts.len());

    println!();
    println!("{}", "Revision Elements".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (name, counts) in &parts {
        if counts.is_empty() {
            println!("{}: {}", name.bold(), "none".dimmed());
            continue;
        }
        println!("{}:", name.bold());
        for count in counts {
            println!("  {} {}", count.element, count.count);
        }
    }

    println!();
    println!("{}", "Change Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Insertions".bold(), insertions);
    println!("{}: {}", "Deletions".bold(), deletions);
    if replacements > 0 {
        println!("{}: {}", "Replacements".bold(), replacements);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "untrack".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Tracked-change acceptance tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/untrack".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_next_to_input() {
        let path = output_path(Path::new("docs/draft.docx"), None);
        assert_eq!(path, PathBuf::from("docs/draft.accepted.docx"));
    }

    #[test]
    fn test_output_path_in_out_dir() {
        let path = output_path(Path::new("docs/draft.docx"), Some(Path::new("out")));
        assert_eq!(path, PathBuf::from("out/draft.accepted.docx"));

        let path = output_path(Path::new("part"), Some(Path::new("out")));
        assert_eq!(path, PathBuf::from("out/part.accepted"));
    }

    #[test]
    fn test_cmd_accept_xml_part() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("document.xml");
        fs::write(
            &input,
            r#"<w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:del><w:r><w:delText>Gone</w:delText></w:r></w:del></w:p>"#,
        )
        .unwrap();

        cmd_accept(&Untrack::new(), &[input.clone()], None, None).unwrap();

        let cleaned = fs::read_to_string(dir.path().join("document.accepted.xml")).unwrap();
        assert!(!cleaned.contains("Gone"));
    }

    #[test]
    fn test_write_xml_keeps_declared_encoding() {
        let mut xml = br#"<?xml version="1.0" encoding="ISO-8859-1"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>caf"#.to_vec();
        xml.push(0xE9);
        xml.extend_from_slice(b"</w:t></w:r></w:p></w:body></w:document>");

        let result = accept_revisions(&xml, &AcceptOptions::default()).unwrap();
        let mut out = Vec::new();
        write_xml(&mut out, &result.xml).unwrap();
        assert_eq!(out, xml);
    }

    #[test]
    fn test_cmd_clean_xml_latin1_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("part.xml");
        let output = dir.path().join("clean.xml");
        let mut xml = br#"<?xml version="1.0" encoding="ISO-8859-1"?><w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:r><w:t>na"#.to_vec();
        xml.push(0xEF);
        xml.extend_from_slice(b"ve</w:t></w:r><w:del><w:r><w:delText>x</w:delText></w:r></w:del></w:p>");
        fs::write(&input, &xml).unwrap();

        cmd_clean_xml(&input, Some(&output), false).unwrap();

        let cleaned = fs::read(&output).unwrap();
        assert!(cleaned.contains(&0xEF));
        assert!(!cleaned.windows(9).any(|w| w == b"w:delText"));
    }

    #[test]
    fn test_change_totals_counts_each_kind() {
        let changes = vec![
            Change::insertion("a", untrack::ChangeSourceKind::Docx).unwrap(),
            Change::deletion("b", untrack::ChangeSourceKind::Docx).unwrap(),
            Change::paired("c", "d", untrack::ChangeSourceKind::Pdf).unwrap(),
        ];
        assert_eq!(change_totals(&changes), (1, 1, 1));
    }

    #[test]
    fn test_cmd_accept_rejects_output_with_many_inputs() {
        let inputs = [PathBuf::from("a.docx"), PathBuf::from("b.docx")];
        let result = cmd_accept(&Untrack::new(), &inputs, Some(Path::new("x.docx")), None);
        assert!(result.is_err());
    }
}
