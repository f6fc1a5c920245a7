//! # jis-charsets CLI
//!
//! Command-line front end for sweeping the JIS coordinate space, converting
//! coordinates and inspecting single positions.

#[cfg(feature = "cli")]
use std::fs::File;
#[cfg(feature = "cli")]
use std::io::{self, BufWriter, Write};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing::{debug, info};
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use jis_charsets::record::render_bytes;
#[cfg(feature = "cli")]
use jis_charsets::{
    hex, kuten, utf16_hex, CodecSet, Config, Encoding, Entry, ExceptionTables, Kuten, MenKuten,
    Section, Sweep,
};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// jis-charsets: cross-encoding tables for the JIS character sets
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "jis-charsets")]
#[command(version, about, long_about = None)]
#[command(author = "jis-charsets Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Emit one line per record for the whole coordinate space
    Sweep(SweepArgs),

    /// Convert a coordinate to its JIS, EUC-JP, Shift_JIS and ISO-2022-JP forms
    Kuten(KutenArgs),

    /// Build, check and classify the records of one coordinate
    Inspect(InspectArgs),

    /// Encode text in the configured encodings
    Encode(EncodeArgs),

    /// List the configured encodings
    List,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct SweepArgs {
    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave out JIS X 0212
    #[arg(long)]
    no_jis0212: bool,

    /// Leave out the vendor rows 89 to 114
    #[arg(long)]
    no_vendor_blocks: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct KutenArgs {
    /// Row (ku)
    row: u8,

    /// Column (ten)
    col: u8,

    /// Plane (men) of a JIS X 0213 coordinate
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
    plane: Option<u8>,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct InspectArgs {
    /// Row (ku)
    row: u8,

    /// Column (ten)
    col: u8,

    /// Inspect a JIS X 0213 position on this plane
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
    plane: Option<u8>,

    /// Inspect a JIS X 0212 position
    #[arg(long, conflicts_with = "plane")]
    jis0212: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct EncodeArgs {
    /// Text to encode
    text: String,

    /// Only this encoding
    #[arg(short, long)]
    encoding: Option<EncodingArg>,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug)]
enum EncodingArg {
    Encoding(Encoding),
}

#[cfg(feature = "cli")]
impl std::str::FromStr for EncodingArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_uppercase().replace(['-', '_'], "");
        let encoding = match normalized.as_str() {
            "JIS" | "ISO2022JP" => Encoding::ISO_2022_JP,
            "EUCJP" => Encoding::EUC_JP,
            "SJIS" | "SHIFTJIS" => Encoding::SHIFT_JIS,
            "SJIS2004" | "SHIFTJIS2004" => Encoding::SHIFT_JIS_2004,
            "CP932" | "MS932" | "WINDOWS31J" => Encoding::WINDOWS_31J,
            "IBM942" | "CP942" => Encoding::IBM_942,
            "IBM943" | "CP943" => Encoding::IBM_943,
            "IBM930" | "CP930" => Encoding::IBM_930,
            "IBM939" | "CP939" => Encoding::IBM_939,
            _ => anyhow::bail!("Unknown encoding: {}", s),
        };
        Ok(EncodingArg::Encoding(encoding))
    }
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct CoordinateForms {
    coordinate: String,
    jis: Option<String>,
    euc_jp: Option<String>,
    shift_jis: Option<String>,
    iso_2022_jp: Option<String>,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct EncodingInfo {
    name: &'static str,
    stateful: bool,
    ebcdic: bool,
    table_driven: bool,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Sweep(ref args) => sweep_command(args, &cli, &config)?,
        Commands::Kuten(ref args) => kuten_command(args, &cli)?,
        Commands::Inspect(ref args) => inspect_command(args, &cli, &config)?,
        Commands::Encode(ref args) => encode_command(args, &cli, &config)?,
        Commands::List => list_command(&cli, &config)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn load(config: &Config) -> Result<(CodecSet, ExceptionTables)> {
    let codecs = config.codecs().context("Failed to load mapping tables")?;
    let tables = config
        .exception_tables()
        .context("Failed to load exception tables")?;
    debug!(encodings = codecs.encodings().count(), "codecs ready");
    Ok((codecs, tables))
}

#[cfg(feature = "cli")]
fn sweep_command(args: &SweepArgs, cli: &Cli, config: &Config) -> Result<()> {
    let start_time = std::time::Instant::now();
    let (codecs, tables) = load(config)?;

    let mut options = config.sweep;
    options.jis_x0212 &= !args.no_jis0212;
    options.vendor_blocks &= !args.no_vendor_blocks;

    let sweep = Sweep::new(&codecs, &tables, config.classifier, options);
    let entries = sweep.run().context("Sweep failed")?;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let encodings: Vec<Encoding> = codecs.encodings().collect();
    match cli.format {
        OutputFormat::Json => {
            for entry in &entries {
                writeln!(out, "{}", serde_json::to_string(entry)?)?;
            }
        }
        OutputFormat::Text => {
            let names: Vec<&str> = encodings.iter().map(|e| e.name()).collect();
            writeln!(out, "section\tcoordinate\tutf16\tkubun\tcharacter\t{}", names.join("\t"))?;
            for entry in &entries {
                writeln!(out, "{}", sweep_line(entry, &encodings))?;
            }
        }
    }
    out.flush()?;

    info!(
        entries = entries.len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "sweep written"
    );
    Ok(())
}

#[cfg(feature = "cli")]
fn sweep_line(entry: &Entry, encodings: &[Encoding]) -> String {
    let record = &entry.record;
    let mut fields = vec![
        entry.section.to_string(),
        entry.coordinate.to_string(),
        utf16_hex(&record.canonical),
        entry.kubun.to_string(),
        record.canonical.clone(),
    ];
    fields.extend(encodings.iter().map(|&e| {
        record
            .encoded(e)
            .map(|bytes| render_bytes(e, bytes))
            .unwrap_or_default()
    }));
    fields.join("\t")
}

#[cfg(feature = "cli")]
fn kuten_command(args: &KutenArgs, cli: &Cli) -> Result<()> {
    let (row, col) = (args.row, args.col);
    let plane = args.plane.unwrap_or(1);

    let coordinate = match args.plane {
        Some(plane) => MenKuten::new(plane, row, col).to_string(),
        None => Kuten::new(row, col).to_string(),
    };
    let shift_jis = match args.plane {
        Some(plane) => kuten::kuten_to_shift_jis_plane(plane, row, col),
        None => kuten::kuten_to_shift_jis(row, col),
    };
    let euc_len = if plane == 1 { 2 } else { 3 };
    let forms = CoordinateForms {
        coordinate,
        jis: kuten::kuten_to_jis(row, col).ok().map(|w| format!("{:04X}", w)),
        euc_jp: kuten::kuten_to_euc_plane(plane, row, col)
            .ok()
            .map(|w| hex(&kuten::to_bytes(w, euc_len))),
        shift_jis: shift_jis.as_ref().ok().map(|w| format!("{:04X}", w)),
        iso_2022_jp: kuten::kuten_to_iso2022(plane, row, col).ok().map(|b| hex(&b)),
    };

    if forms.jis.is_none() && forms.shift_jis.is_none() {
        if let Err(e) = shift_jis {
            return Err(e).with_context(|| format!("No encoding addresses {}", forms.coordinate));
        }
    }

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&forms)?),
        OutputFormat::Text => {
            println!("Coordinate:  {}", forms.coordinate);
            let sjis_name = if args.plane.is_some() {
                "Shift_JIS-2004"
            } else {
                "Shift_JIS"
            };
            let rows = [
                ("JIS", &forms.jis),
                ("EUC-JP", &forms.euc_jp),
                (sjis_name, &forms.shift_jis),
                ("ISO-2022-JP", &forms.iso_2022_jp),
            ];
            for (name, value) in rows {
                println!("{:<12} {}", format!("{}:", name), value.as_deref().unwrap_or("-"));
            }
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn inspect_command(args: &InspectArgs, cli: &Cli, config: &Config) -> Result<()> {
    let (codecs, tables) = load(config)?;
    let sweep = Sweep::new(&codecs, &tables, config.classifier, config.sweep);
    let builder = sweep.builder();
    let (row, col) = (args.row, args.col);

    let entries = if args.jis0212 {
        let record = builder.jis0212(row, col)?;
        vec![sweep.entry(Section::for_jis0212(row), record)]
    } else if let Some(plane) = args.plane {
        let record = builder
            .jis0213(plane, row, col)
            .with_context(|| format!("Cannot inspect {}", MenKuten::new(plane, row, col)))?;
        vec![sweep.entry(Section::for_jis0213(plane, row), record)]
    } else {
        sweep
            .double_byte(row, col)
            .with_context(|| format!("Cannot inspect {}", Kuten::new(row, col)))?
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_entry(entry);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn print_entry(entry: &Entry) {
    let record = &entry.record;
    println!("Coordinate: {} ({})", entry.coordinate, entry.section);
    if record.is_undefined() {
        println!("Character:  undefined");
    } else {
        println!("Character:  {} [{}]", record.canonical, utf16_hex(&record.canonical));
    }
    println!("Defining:   {}", hex(&record.defining));
    println!("Kubun:      {}", entry.kubun);
    if record.nfc != record.canonical {
        println!("NFC:        {} [{}]", record.nfc, utf16_hex(&record.nfc));
    }
    if record.nfkc != record.canonical {
        println!("NFKC:       {} [{}]", record.nfkc, utf16_hex(&record.nfkc));
    }
    if let Some(variant) = record.distinct_variant() {
        println!("Variant:    {} [{}]", variant.alternate, utf16_hex(&variant.alternate));
    }
    println!();
    for (encoding, verdict) in entry.fidelity.iter() {
        let bytes = record
            .encoded(encoding)
            .map(|b| render_bytes(encoding, b))
            .unwrap_or_default();
        println!("  {:<15} {:<24} {}", encoding.name(), bytes, verdict.outcome);
    }
}

#[cfg(feature = "cli")]
fn encode_command(args: &EncodeArgs, cli: &Cli, config: &Config) -> Result<()> {
    let codecs = config.codecs().context("Failed to load mapping tables")?;
    let encodings: Vec<Encoding> = match &args.encoding {
        Some(EncodingArg::Encoding(e)) => {
            if !codecs.contains(*e) {
                anyhow::bail!("{} is not configured", e);
            }
            vec![*e]
        }
        None => codecs.encodings().collect(),
    };

    let encoded: Vec<(Encoding, String)> = encodings
        .into_iter()
        .filter_map(|e| codecs.encode(e, &args.text).map(|bytes| (e, hex(&bytes))))
        .collect();

    match cli.format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = encoded
                .into_iter()
                .map(|(e, bytes)| (e.name().to_string(), serde_json::Value::String(bytes)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Text => {
            for (encoding, bytes) in encoded {
                println!("{:<15} {}", encoding.name(), bytes);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn list_command(cli: &Cli, config: &Config) -> Result<()> {
    let codecs = config.codecs().context("Failed to load mapping tables")?;
    let infos: Vec<EncodingInfo> = codecs
        .encodings()
        .map(|e| EncodingInfo {
            name: e.name(),
            stateful: e.is_stateful(),
            ebcdic: e.is_ebcdic(),
            table_driven: e.is_code_page() || e == Encoding::SHIFT_JIS_2004,
        })
        .collect();

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&infos)?),
        OutputFormat::Text => {
            println!("Configured Encodings ({} of {}):", infos.len(), Encoding::ALL.len());
            println!();
            for info in &infos {
                let mut flags = Vec::new();
                if info.stateful {
                    flags.push("stateful");
                }
                if info.ebcdic {
                    flags.push("EBCDIC");
                }
                if info.table_driven {
                    flags.push("table");
                }
                println!("  {:<15} {}", info.name, flags.join(", "));
            }
            let missing: Vec<&str> = Encoding::ALL
                .iter()
                .filter(|e| !codecs.contains(**e))
                .map(|e| e.name())
                .collect();
            if !missing.is_empty() {
                println!();
                println!("Not configured: {}", missing.join(", "));
            }
        }
    }
    Ok(())
}
