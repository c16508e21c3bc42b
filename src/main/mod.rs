use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gbtracks::{
    commands::{genome_map, load_bed_track, load_file, load_vcf, BedTrackOptions},
    io::OutputFile,
    prelude::*,
    reporting::CommandOutput,
    sink::FastaDirectory,
};
use std::io::Write;

#[cfg(feature = "dev-commands")]
use gbtracks::commands::random_value_bed;

const INFO: &str = "\
gbtracks: load genomic annotations into genome browser tracks
usage: gbtracks [--help] <subcommand>

Subcommands:

  assembly: resolve an assembly and print its chromosomes.
  load: load BED, GFF, GenBank, VCF and FASTA files into tracks.
  genomemap: build the genome map overview series of a value track.

";

#[derive(Parser)]
#[clap(name = "gbtracks")]
#[clap(about = INFO)]
struct Cli {
    /// verbosity (-v for progress, -vv for parser details)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Assembly {
        /// a registry name (NCBI36, GRCh37, GRCh38), a BED file of `chrom offset
        /// length` records, or FASTA files
        #[arg(required = true)]
        assembly: Vec<String>,

        /// print the chromosome band table as JSON instead of TSV
        #[arg(long)]
        bands: bool,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Load {
        /// a registry name, a BED assembly file, or FASTA files (repeatable)
        #[arg(long, required = true)]
        assembly: Vec<String>,

        /// annotation files; the format is detected from the extension or content
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// directory for tracks.tsv, segments.tsv and genes.tsv
        #[arg(long, default_value = "tracks")]
        outdir: PathBuf,

        /// directory for one FASTA file per sequence (GenBank and FASTA inputs)
        #[arg(long)]
        sequences: Option<PathBuf>,

        /// BED files: track kind
        #[arg(long, value_enum, default_value_t = TrackKind::Gene)]
        kind: TrackKind,

        /// BED files: track color
        #[arg(long)]
        color: Option<String>,

        /// BED files: `min,max` drawing scale of value and score tracks
        #[arg(long, value_delimiter = ',', num_args = 2)]
        scale: Option<Vec<f64>>,

        /// VCF files: INFO keys to show (repeatable)
        #[arg(long)]
        show: Vec<String>,

        /// tracks to remove by name once everything is loaded (repeatable)
        #[arg(long)]
        remove: Vec<String>,
    },
    Genomemap {
        /// a registry name, a BED assembly file, or FASTA files (repeatable)
        #[arg(long, required = true)]
        assembly: Vec<String>,

        /// a BED file whose score column holds the values to map
        #[arg(long)]
        values: Option<PathBuf>,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    #[cfg(feature = "dev-commands")]
    RandomBed {
        /// a registry name, a BED assembly file, or FASTA files (repeatable)
        #[arg(long, required = true)]
        assembly: Vec<String>,

        /// number of random ranges to generate
        #[arg(long, required = true)]
        num: usize,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn output_file(output: Option<&PathBuf>) -> OutputFile {
    output.map_or(OutputFile::new_stdout(None), |file| {
        OutputFile::new(file, None)
    })
}

fn print_assembly(
    assembly: &[String],
    bands: bool,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, GbError> {
    let assembly = AssemblySpec::from_args(assembly).resolve()?;
    let mut writer = output_file(output).writer()?;
    if bands {
        writeln!(writer, "{}", serde_json::to_string(&assembly.chromosome_bands())?)?;
    } else {
        write!(writer, "{}", assembly.to_tsv())?;
    }
    Ok(CommandOutput::new((), IngestReport::new()))
}

#[allow(clippy::too_many_arguments)]
fn load(
    assembly: &[String],
    files: &[PathBuf],
    outdir: &Path,
    sequences: Option<&PathBuf>,
    bed_options: &BedTrackOptions,
    vcf_options: &VcfOptions,
    remove: &[String],
) -> Result<CommandOutput<()>, GbError> {
    let assembly = AssemblySpec::from_args(assembly).resolve()?;
    let mut sink = MemorySink::new();
    let mut sequence_sink: Box<dyn SequenceSink> = match sequences {
        Some(directory) => Box::new(FastaDirectory::new(directory)?),
        None => Box::new(MemorySequences::new()),
    };

    let mut report = IngestReport::new();
    for file in files {
        let file_report = match AnnotationFile::detect(file)? {
            AnnotationFile::Bed(path) => load_bed_track(path, bed_options, &mut sink)?.report,
            AnnotationFile::Vcf(path) => load_vcf(path, vcf_options, &mut sink)?.report,
            _ => load_file(file, &mut sink, sequence_sink.as_mut())?,
        };
        report.merge(file_report);
    }
    for name in remove {
        if sink.remove_track(name)? == 0 {
            report.add_issue(format!("no track named '{}' to remove", name));
        }
    }

    let unknown = sink
        .segments()
        .iter()
        .filter(|segment| assembly.find(&segment.chrom).is_none())
        .count();
    if unknown > 0 {
        report.add_issue(format!(
            "{} segments are on chromosomes outside the assembly",
            unknown
        ));
    }

    std::fs::create_dir_all(outdir)?;
    sink.write_tracks(&OutputFile::new(outdir.join("tracks.tsv"), None))?;
    sink.write_segments(&OutputFile::new(outdir.join("segments.tsv"), None))?;
    sink.write_gene_view(&OutputFile::new(outdir.join("genes.tsv"), None))?;
    Ok(CommandOutput::new((), report))
}

fn write_genome_map(
    assembly: &[String],
    values: Option<&PathBuf>,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, GbError> {
    let assembly = AssemblySpec::from_args(assembly).resolve()?;
    let map = genome_map(&assembly, values.map(PathBuf::as_path))?;
    let mut writer = output_file(output).writer()?;
    writeln!(writer, "{}", map.value.to_json()?)?;
    Ok(CommandOutput::new((), map.report))
}

fn run() -> Result<(), GbError> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let result = match &cli.command {
        Some(Commands::Assembly {
            assembly,
            bands,
            output,
        }) => print_assembly(assembly, *bands, output.as_ref()),
        Some(Commands::Load {
            assembly,
            files,
            outdir,
            sequences,
            kind,
            color,
            scale,
            show,
            remove,
        }) => {
            let bed_options = BedTrackOptions {
                name: None,
                kind: *kind,
                color: color.clone(),
                scale: scale.as_deref().and_then(|s| match s {
                    [min, max] => Some([*min, *max]),
                    _ => None,
                }),
            };
            let vcf_options = VcfOptions {
                track_name: None,
                show: (!show.is_empty()).then(|| show.clone()),
            };
            load(
                assembly,
                files,
                outdir,
                sequences.as_ref(),
                &bed_options,
                &vcf_options,
                remove,
            )
        }
        Some(Commands::Genomemap {
            assembly,
            values,
            output,
        }) => write_genome_map(assembly, values.as_ref(), output.as_ref()),
        #[cfg(feature = "dev-commands")]
        Some(Commands::RandomBed {
            assembly,
            num,
            output,
        }) => {
            let assembly = AssemblySpec::from_args(assembly).resolve()?;
            random_value_bed(&assembly, *num, output.as_ref())
        }
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    };
    let output = result?;
    let report = output.report;
    if report.records > 0 || !report.issue_lines().is_empty() {
        eprintln!(
            "{} records, {} segments, {} tracks; skipped {} malformed, {} unresolved, {} format mismatches",
            report.records,
            report.segments,
            report.tracks,
            report.malformed,
            report.unresolved,
            report.format_mismatch
        );
        for issue in report.issue_lines() {
            eprintln!("  {}", issue);
        }
    }
    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
