use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use clap::Parser;
use fusion_dict::makedict::{
    is_binary_dictionary, read_dictionary_file, write_dictionary,
    xml::{read_bigram_map, read_dictionary_xml, write_dictionary_xml},
    FusionDictionary, Result,
};

/// Converts word lists between the markup and binary dictionary formats.
#[derive(Parser)]
#[command(name = "makedict", version)]
struct Cli {
    /// Input file, markup word list or binary dictionary
    #[arg(short = 's', long = "source", value_name = "FILE")]
    source: Option<PathBuf>,

    /// Input file, as a positional argument
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Markup bigram list to attach to a markup input
    #[arg(short = 'b', long = "bigrams", value_name = "FILE")]
    bigrams: Option<PathBuf>,

    /// Binary dictionary to write
    #[arg(short = 'd', long = "dict", value_name = "FILE")]
    binary_output: Option<PathBuf>,

    /// Markup word list to write
    #[arg(short = 'x', long = "xml", value_name = "FILE")]
    xml_output: Option<PathBuf>,

    /// Show progress logs
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Validated command line.
struct Arguments {
    input: PathBuf,
    input_is_binary: bool,
    bigrams: Option<PathBuf>,
    binary_output: Option<PathBuf>,
    xml_output: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    // --verbose shows info logs unless RUST_LOG says otherwise; without it
    // only RUST_LOG turns logging on.
    let filter = if verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "off".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Two paths name the same file, comparing canonical forms when they exist.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn check_arguments(cli: Cli) -> std::result::Result<Arguments, String> {
    let input = match (cli.source, cli.input) {
        (Some(_), Some(_)) => return Err("Multiple input files: only one is supported".to_string()),
        (Some(input), None) | (None, Some(input)) => input,
        (None, None) => return Err("Missing input file".to_string()),
    };
    if cli.binary_output.is_none() && cli.xml_output.is_none() {
        return Err("Missing output file: use -d and/or -x".to_string());
    }

    let input_is_binary = is_binary_dictionary(&input);
    if input_is_binary && cli.bigrams.is_some() {
        return Err("Please specify a markup input to use a bigram file".to_string());
    }

    let outputs: Vec<&PathBuf> = cli.binary_output.iter().chain(cli.xml_output.iter()).collect();
    for output in &outputs {
        if same_file(&input, output) {
            return Err(format!("Input and output are the same file: {}", output.display()));
        }
        if let Some(bigrams) = &cli.bigrams {
            if same_file(bigrams, output) {
                return Err(format!(
                    "Bigram input and output are the same file: {}",
                    output.display()
                ));
            }
        }
    }
    if let [first, second] = outputs.as_slice() {
        if same_file(first, second) {
            return Err("Binary and markup outputs are the same file".to_string());
        }
    }

    Ok(Arguments {
        input,
        input_is_binary,
        bigrams: cli.bigrams,
        binary_output: cli.binary_output,
        xml_output: cli.xml_output,
    })
}

fn read_input(args: &Arguments) -> Result<FusionDictionary> {
    if args.input_is_binary {
        return read_dictionary_file(&args.input);
    }
    let bigrams = match &args.bigrams {
        Some(path) => Some(read_bigram_map(BufReader::new(File::open(path)?))?),
        None => None,
    };
    read_dictionary_xml(BufReader::new(File::open(&args.input)?), bigrams.as_ref())
}

fn run(args: &Arguments) -> Result<()> {
    let mut dict = read_input(args)?;
    println!(
        "Read {} words ({} groups in {} nodes) from {}",
        dict.len(),
        dict.count_char_groups(),
        dict.count_nodes(),
        args.input.display()
    );

    if let Some(path) = &args.binary_output {
        let mut out = BufWriter::new(File::create(path)?);
        write_dictionary(&mut out, &mut dict)?;
        println!("Wrote binary dictionary to {}", path.display());
    }
    if let Some(path) = &args.xml_output {
        let mut out = BufWriter::new(File::create(path)?);
        write_dictionary_xml(&mut out, &dict)?;
        println!("Wrote markup word list to {}", path.display());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let args = match check_arguments(cli) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("ERROR: {}", message);
            eprintln!(
                "Usage: makedict -s <input> [-b <bigrams.xml>] [-d <output.dict>] [-x <output.xml>]"
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("ERROR: Failed to convert {}", args.input.display());
        eprintln!("  {}", e);
        std::process::exit(1);
    }
}
