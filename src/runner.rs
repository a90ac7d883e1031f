// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use log::{info, warn};
use serde::Serialize;

use clap::{Parser, ValueEnum};

use crate::blast::BlastHit;
use crate::config::{find_config, ToolsConfig};
use crate::errors::SeqPropError;
use crate::export::ExportDict;
use crate::mutations::MutationSummary;
use crate::seq::fasta::read_single_fasta_record;
use crate::seqprop::{BlastPdbOptions, SeqProp};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None) ]
struct Cli {
    /// Sequence file (FastA, one record)
    seq_fname: String,

    /// Record id (default: the FastA record's id)
    #[arg(long)]
    id: Option<String>,

    /// Output format
    #[arg(short, long = "format", default_value_t = OutputFormat::Json,
        help = "Output format [json|table] (or just j|t); default: json",
        hide_default_value = true,
        hide_possible_values = true,
    )]
    format: OutputFormat,

    /// Only export these keys (repeatable)
    #[arg(long = "only")]
    only: Vec<String>,

    /// Never export these keys (repeatable)
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<String>,

    /// Add the built-in protein analysis to the annotations
    #[arg(short, long)]
    analysis: bool,

    /// Run EMBOSS pepstats on the sequence file
    #[arg(short, long)]
    pepstats: bool,

    /// Search the PDB with remote BLAST
    #[arg(short, long = "blast-pdb")]
    blast_pdb: bool,

    /// E-value cutoff for BLAST hits
    #[arg(long, default_value_t = 0.0001)]
    evalue: f64,

    /// Minimum fraction of identical residues for BLAST hits
    #[arg(long = "seq-ident-cutoff", default_value_t = 0.0)]
    seq_ident_cutoff: f64,

    /// Log a link to each BLAST hit
    #[arg(long = "display-link")]
    display_link: bool,

    /// Directory for BLAST results (default: the sequence file's directory)
    #[arg(short, long)]
    outdir: Option<PathBuf>,

    /// Rerun external programs even if their results exist
    #[arg(long)]
    force: bool,

    /// Sequence alignments (JSON array); prints the mutation summary
    #[arg(long)]
    alignments: Option<PathBuf>,

    /// Tools config (default: .seqpropconfig in $HOME or the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum OutputFormat {
    #[clap(name = "json")]
    #[clap(alias = "j")]
    Json,
    #[clap(name = "table")]
    #[clap(alias = "t")]
    Table,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Serialize)]
struct Report {
    record: ExportDict,
    #[serde(skip_serializing_if = "Option::is_none")]
    mutation_summary: Option<MutationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blast_pdb: Option<Vec<BlastHit>>,
}

impl Report {
    fn to_table(&self) -> String {
        let mut lines = vec![self.record.to_table()];
        if let Some(summary) = &self.mutation_summary {
            for (m, members) in summary.single_counter.iter() {
                lines.push(format!("single\t{}\t{}", m, members.join(";")));
            }
            for (fp, members) in summary.fingerprint_counter.iter() {
                lines.push(format!(
                    "fingerprint\t{}\t{}",
                    fp.iter().join(","),
                    members.join(";")
                ));
            }
        }
        if let Some(hits) = &self.blast_pdb {
            for hit in hits {
                lines.push(format!(
                    "blast_pdb\t{}\t{}\t{:.3}\t{:e}",
                    hit.hit_pdb,
                    hit.hit_pdb_chain.as_deref().unwrap_or(""),
                    hit.hit_percent_ident,
                    hit.hit_evalue
                ));
            }
        }
        lines.join("\n")
    }
}

// A broken config is reported and ignored: the tools are then looked up in PATH.
fn load_tools_config(path: Option<&Path>) -> ToolsConfig {
    let Some(path) = path.map(Path::to_path_buf).or_else(find_config) else {
        return ToolsConfig::default();
    };
    match ToolsConfig::from_file(&path) {
        Ok(tools) => {
            info!("Using tools config {}", path.display());
            tools
        }
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            ToolsConfig::default()
        }
    }
}

fn load_record(cli: &Cli) -> Result<SeqProp, SeqPropError> {
    let id = match &cli.id {
        Some(id) => id.clone(),
        None => read_single_fasta_record(&cli.seq_fname)?.id,
    };
    let mut seq_prop = SeqProp::builder(id).sequence_path(&cli.seq_fname).build()?;
    if let Some(rec) = &seq_prop.seq_record {
        if !rec.description.is_empty() {
            seq_prop.description = rec.description.clone();
        }
    }
    if let Some(path) = &cli.alignments {
        let text = fs::read_to_string(path)?;
        seq_prop.sequence_alignments = serde_json::from_str(&text)?;
        info!(
            "{}: loaded {} sequence alignments",
            seq_prop.id,
            seq_prop.sequence_alignments.len()
        );
    }
    Ok(seq_prop)
}

fn build_report(cli: &Cli, tools: &ToolsConfig) -> Result<Report, SeqPropError> {
    let mut seq_prop = load_record(cli)?;

    if cli.analysis && !seq_prop.get_default_protein_analysis()? {
        warn!("{}: protein analysis skipped", seq_prop.id);
    }
    if cli.pepstats {
        seq_prop.get_emboss_pepstats(&tools.pepstats().force_rerun(cli.force))?;
    }
    let blast_pdb = if cli.blast_pdb {
        let options = BlastPdbOptions {
            seq_ident_cutoff: cli.seq_ident_cutoff,
            evalue: cli.evalue,
            display_link: cli.display_link,
            outdir: cli.outdir.clone(),
            force_rerun: cli.force,
        };
        seq_prop.blast_pdb(&tools.blastp(), &options)?
    } else {
        None
    };
    let mutation_summary = match cli.alignments {
        Some(_) => seq_prop.sequence_mutation_summary(),
        None => None,
    };

    let only: Vec<&str> = cli.only.iter().map(String::as_str).collect();
    let exclude: Vec<&str> = cli.exclude.iter().map(String::as_str).collect();
    let only = if only.is_empty() { None } else { Some(only.as_slice()) };
    let record = seq_prop.get_dict(only, &exclude, cli.format == OutputFormat::Table);

    Ok(Report {
        record,
        mutation_summary,
        blast_pdb,
    })
}

fn render(report: &Report, format: OutputFormat) -> Result<String, SeqPropError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Table => Ok(report.to_table()),
    }
}

pub fn run() -> Result<(), SeqPropError> {
    env_logger::init();
    info!("Starting log");

    let cli = Cli::parse();
    let tools = load_tools_config(cli.config.as_deref());
    let report = build_report(&cli, &tools)?;
    println!("{}", render(&report, cli.format)?);

    Ok(())
}
