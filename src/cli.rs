// Command-line front end for lbin.
//
// Packs a stream of JSON documents into the tagged binary format, unpacks
// binary files back into JSON lines, and moves packed files between
// compression algorithms.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::compress::{self, ALGORITHM_NAMES, Algorithm, DEFAULT_LEVEL, PackOptions};
use crate::value::{Table, TableError, Value};
use crate::wire::DEFAULT_MAX_DEPTH;

const BUF_SIZE: usize = 64 * 1024;

fn parse_algorithm(s: &str) -> Result<Algorithm, String> {
    s.parse().map_err(|e: compress::CompressError| e.to_string())
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Tagged binary serializer for dynamic values.
#[derive(Parser, Debug)]
#[command(
    name = "lbin",
    version,
    about = "Pack JSON documents into compressed tagged binary and back",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Pack a stream of JSON documents.
    Pack(PackArgs),
    /// Unpack a file into JSON lines.
    Unpack(UnpackArgs),
    /// Unpack with one algorithm and pack with another.
    Recompress(RecompressArgs),
    /// Print compiled-in backends and defaults.
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Input file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PackArgs {
    /// Compression algorithm (none, snappy, zlib, zstd).
    #[arg(long, short = 'a', value_parser = parse_algorithm, default_value = "snappy")]
    algorithm: Algorithm,

    /// Compression level (zlib 1-9, zstd per library; ignored otherwise).
    #[arg(long, short = 'l', allow_negative_numbers = true, default_value_t = DEFAULT_LEVEL)]
    level: i32,

    /// Maximum table nesting depth.
    #[arg(long = "max-depth", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Write the raw wire format without compression.
    #[arg(long = "no-compress", conflicts_with = "algorithm")]
    no_compress: bool,

    #[command(flatten)]
    io: IoArgs,
}

#[derive(Args, Debug)]
struct UnpackArgs {
    /// Compression algorithm the input was packed with.
    #[arg(long, short = 'a', value_parser = parse_algorithm, default_value = "snappy")]
    algorithm: Algorithm,

    /// Maximum table nesting depth.
    #[arg(long = "max-depth", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Input is the raw wire format.
    #[arg(long = "no-compress", conflicts_with = "algorithm")]
    no_compress: bool,

    /// Print only the number of values.
    #[arg(long)]
    count: bool,

    #[command(flatten)]
    io: IoArgs,
}

#[derive(Args, Debug)]
struct RecompressArgs {
    /// Algorithm the input was packed with.
    #[arg(long, value_parser = parse_algorithm, default_value = "snappy")]
    from: Algorithm,

    /// Algorithm to pack the output with.
    #[arg(long, value_parser = parse_algorithm, default_value = "snappy")]
    to: Algorithm,

    /// Compression level for the output.
    #[arg(long, short = 'l', allow_negative_numbers = true, default_value_t = DEFAULT_LEVEL)]
    level: i32,

    /// Maximum table nesting depth.
    #[arg(long = "max-depth", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[command(flatten)]
    io: IoArgs,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Print configuration as JSON.
    #[arg(long)]
    json: bool,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pack,
    Unpack,
    Recompress,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    /// Settings for reading packed input.
    read: PackOptions,
    /// Settings for writing packed output.
    write: PackOptions,
    count_only: bool,
    json_output: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl Options {
    fn new(command: Command, force: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            command,
            use_stdout: false,
            force,
            quiet,
            verbose,
            read: PackOptions::default(),
            write: PackOptions::default(),
            count_only: false,
            json_output: false,
            input_file: None,
            output_file: None,
        }
    }

    fn with_io(mut self, io: IoArgs) -> Self {
        self.use_stdout = io.stdout;
        self.input_file = io.input.or(io.input_pos);
        self.output_file = io.output.or(io.output_pos);
        self
    }
}

fn resolve_options(cli: Cli) -> Options {
    let quiet = cli.quiet;
    let verbose = cli.verbose.min(2);
    let force = cli.force;

    match cli.command {
        Cmd::Pack(args) => {
            let algorithm = if args.no_compress {
                Algorithm::None
            } else {
                args.algorithm
            };
            let mut opts = Options::new(Command::Pack, force, quiet, verbose).with_io(args.io);
            opts.write = PackOptions::default()
                .with_algorithm(algorithm)
                .with_level(args.level)
                .with_max_depth(args.max_depth);
            opts
        }
        Cmd::Unpack(args) => {
            let algorithm = if args.no_compress {
                Algorithm::None
            } else {
                args.algorithm
            };
            let mut opts = Options::new(Command::Unpack, force, quiet, verbose).with_io(args.io);
            opts.read = PackOptions::default()
                .with_algorithm(algorithm)
                .with_max_depth(args.max_depth);
            opts.count_only = args.count;
            opts
        }
        Cmd::Recompress(args) => {
            let mut opts =
                Options::new(Command::Recompress, force, quiet, verbose).with_io(args.io);
            opts.read = PackOptions::default()
                .with_algorithm(args.from)
                .with_max_depth(args.max_depth);
            opts.write = PackOptions::default()
                .with_algorithm(args.to)
                .with_level(args.level)
                .with_max_depth(args.max_depth);
            opts
        }
        Cmd::Config(args) => {
            let mut opts = Options::new(Command::Config, force, quiet, verbose);
            opts.json_output = args.json;
            opts
        }
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("lbin".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// JSON mapping
// ---------------------------------------------------------------------------

/// Convert a JSON document into a value.
///
/// Arrays fill the array part (nulls leave holes); objects fill the map
/// part with string keys.
fn json_to_value(json: &serde_json::Value) -> Result<Value, TableError> {
    use serde_json::Value as Json;

    Ok(match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Integer(i),
            (None, Some(f)) => Value::Real(f),
            (None, None) => Value::Nil,
        },
        Json::String(s) => Value::from(s.as_str()),
        Json::Array(items) => {
            let mut table = Table::with_capacity(items.len(), 0);
            for (i, item) in items.iter().enumerate() {
                table.insert(i as i64 + 1, json_to_value(item)?)?;
            }
            Value::Table(table)
        }
        Json::Object(fields) => {
            let mut table = Table::with_capacity(0, fields.len());
            for (key, item) in fields {
                table.insert(key.as_str(), json_to_value(item)?)?;
            }
            Value::Table(table)
        }
    })
}

/// Render a value as JSON.
///
/// Tables without map entries become arrays; any other table becomes an
/// object keyed by each key's display form.
fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Nil => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) => Json::from(*i),
        Value::Real(r) => serde_json::Number::from_f64(*r).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(String::from_utf8_lossy(s).into_owned()),
        Value::Table(t) if t.map_len() == 0 => {
            Json::Array(t.array().iter().map(value_to_json).collect())
        }
        Value::Table(t) => {
            let mut fields = serde_json::Map::with_capacity(t.len() + t.map_len());
            for (i, item) in t.array().iter().enumerate() {
                fields.insert((i + 1).to_string(), value_to_json(item));
            }
            for (key, item) in t.pairs() {
                fields.insert(key.to_string(), value_to_json(item));
            }
            Json::Object(fields)
        }
        Value::Code(c) => serde_json::json!({ "code": c.len() }),
        Value::Userdata(u) => serde_json::json!({ "userdata": u.0 }),
    }
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

fn read_input(opts: &Options) -> Result<Vec<u8>, String> {
    let mut data = Vec::new();
    match &opts.input_file {
        Some(path) => File::open(path)
            .and_then(|f| BufReader::with_capacity(BUF_SIZE, f).read_to_end(&mut data))
            .map_err(|e| format!("input file: {}: {e}", path.display()))?,
        None => io::stdin()
            .lock()
            .read_to_end(&mut data)
            .map_err(|e| format!("read error: {e}"))?,
    };
    Ok(data)
}

fn open_output(opts: &Options) -> Result<Box<dyn Write>, String> {
    match (opts.use_stdout, &opts.output_file) {
        (true, _) | (_, None) => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            File::create(path)
                .map(|f| Box::new(BufWriter::with_capacity(BUF_SIZE, f)) as Box<dyn Write>)
                .map_err(|e| format!("output file: {}: {e}", path.display()))
        }
    }
}

fn write_output(opts: &Options, bytes: &[u8]) -> Result<(), String> {
    let mut out = open_output(opts)?;
    out.write_all(bytes)
        .and_then(|()| out.flush())
        .map_err(|e| format!("write error: {e}"))
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config(opts: &Options) -> i32 {
    let version = env!("CARGO_PKG_VERSION");

    let backends: Vec<serde_json::Value> = ALGORITHM_NAMES
        .iter()
        .filter_map(|name| name.parse::<Algorithm>().ok())
        .map(|algo| {
            let backend = algo.backend().ok();
            let levels = backend
                .as_ref()
                .and_then(|b| b.level_range())
                .map(|r| serde_json::json!({ "min": r.start(), "max": r.end() }));
            serde_json::json!({
                "name": algo.name(),
                "available": backend.is_some(),
                "levels": levels,
            })
        })
        .collect();

    if opts.json_output {
        let json = serde_json::json!({
            "version": version,
            "default_algorithm": Algorithm::default().name(),
            "default_level": DEFAULT_LEVEL,
            "default_max_depth": DEFAULT_MAX_DEPTH,
            "backends": backends,
        });
        match serde_json::to_string_pretty(&json) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("lbin: {e}");
                return 1;
            }
        }
        return 0;
    }

    println!("lbin version {version}");
    println!("DEFAULT_ALGORITHM={}", Algorithm::default());
    println!("DEFAULT_LEVEL={DEFAULT_LEVEL}");
    println!("DEFAULT_MAX_DEPTH={DEFAULT_MAX_DEPTH}");
    for b in &backends {
        let name = b["name"].as_str().unwrap_or_default().to_ascii_uppercase();
        let available = b["available"].as_bool().unwrap_or(false) as u8;
        match (b["levels"]["min"].as_i64(), b["levels"]["max"].as_i64()) {
            (Some(min), Some(max)) => println!("{name}={available} LEVELS={min}..={max}"),
            _ => println!("{name}={available}"),
        }
    }
    0
}

// ---------------------------------------------------------------------------
// Pack command
// ---------------------------------------------------------------------------

fn cmd_pack(opts: &Options) -> i32 {
    let input = match read_input(opts) {
        Ok(data) => data,
        Err(msg) => {
            eprintln!("lbin: {msg}");
            return 1;
        }
    };

    let mut values = Vec::new();
    for doc in serde_json::Deserializer::from_slice(&input).into_iter::<serde_json::Value>() {
        let doc = match doc {
            Ok(doc) => doc,
            Err(e) => {
                eprintln!("lbin: JSON input: {e}");
                return 1;
            }
        };
        match json_to_value(&doc) {
            Ok(value) => values.push(value),
            Err(e) => {
                eprintln!("lbin: JSON input: {e}");
                return 1;
            }
        }
    }

    let packed = match compress::pack_with(&values, &opts.write) {
        Ok(packed) => packed,
        Err(e) => {
            eprintln!("lbin: pack error: {e}");
            return 1;
        }
    };

    if let Err(msg) = write_output(opts, &packed) {
        eprintln!("lbin: {msg}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "lbin: packed {} values: input size: {}, output size: {}, algorithm: {}",
            values.len(),
            input.len(),
            packed.len(),
            opts.write.algorithm
        );
    }
    0
}

// ---------------------------------------------------------------------------
// Unpack command
// ---------------------------------------------------------------------------

fn cmd_unpack(opts: &Options) -> i32 {
    let input = match read_input(opts) {
        Ok(data) => data,
        Err(msg) => {
            eprintln!("lbin: {msg}");
            return 1;
        }
    };

    let values = match compress::unpack_with(&input, &opts.read) {
        Ok(values) => values,
        Err(e) => {
            eprintln!("lbin: unpack error: {e}");
            return 1;
        }
    };

    let mut out = match open_output(opts) {
        Ok(out) => out,
        Err(msg) => {
            eprintln!("lbin: {msg}");
            return 1;
        }
    };

    let result = if opts.count_only {
        writeln!(out, "{}", values.len()).map_err(|e| e.to_string())
    } else {
        values.iter().try_for_each(|value| {
            serde_json::to_writer(&mut out, &value_to_json(value)).map_err(|e| e.to_string())?;
            writeln!(out).map_err(|e| e.to_string())
        })
    };
    if let Err(msg) = result.and_then(|()| out.flush().map_err(|e| e.to_string())) {
        eprintln!("lbin: write error: {msg}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "lbin: unpacked {} values from {} bytes",
            values.len(),
            input.len()
        );
    }
    0
}

// ---------------------------------------------------------------------------
// Recompress command
// ---------------------------------------------------------------------------

fn cmd_recompress(opts: &Options) -> i32 {
    let input = match read_input(opts) {
        Ok(data) => data,
        Err(msg) => {
            eprintln!("lbin: {msg}");
            return 1;
        }
    };

    let values = match compress::unpack_with(&input, &opts.read) {
        Ok(values) => values,
        Err(e) => {
            eprintln!("lbin: unpack error: {e}");
            return 1;
        }
    };

    let packed = match compress::pack_with(&values, &opts.write) {
        Ok(packed) => packed,
        Err(e) => {
            eprintln!("lbin: pack error: {e}");
            return 1;
        }
    };

    if let Err(msg) = write_output(opts, &packed) {
        eprintln!("lbin: {msg}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "lbin: recompressed {} values: {} ({} bytes) -> {} ({} bytes)",
            values.len(),
            opts.read.algorithm,
            input.len(),
            opts.write.algorithm,
            packed.len()
        );
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run() -> ! {
    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    let default_filter = match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Warn if -c overrides output filename.
    if opts.use_stdout
        && let Some(path) = opts.output_file.take()
        && !opts.quiet
    {
        eprintln!(
            "lbin: warning: -c option overrides output filename: {}",
            path.display()
        );
    }

    let exit_code = match opts.command {
        Command::Pack => cmd_pack(&opts),
        Command::Unpack => cmd_unpack(&opts),
        Command::Recompress => cmd_recompress(&opts),
        Command::Config => cmd_config(&opts),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
