use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueHint};
use json_prefix::{
    JsonParseError, JsonParser, JsonValue, ParserConfig, DEFAULT_MAX_DEPTH, MAX_DEPTH_CEILING,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "json-prefix",
    version,
    about = "Parse a JSON value and print every leaf with its path",
    after_help = r#"EXAMPLES
  $ echo '{"work":996,"school":[985,[211,101]]}' | json-prefix
  $.work = 996
  $.school[0] = 985
  $.school[1][0] = 211
  $.school[1][1] = 101

  $ json-prefix --prefix data.json    # ignore whatever follows the first value"#
)]
struct Cli {
    #[arg(
        help = "File to read; stdin when absent or '-'",
        value_hint = ValueHint::FilePath
    )]
    file: Option<PathBuf>,
    #[arg(long, help = "Accept trailing bytes after the first value")]
    prefix: bool,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_DEPTH,
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_DEPTH_CEILING as u64),
        help = "Maximum nesting of arrays and objects"
    )]
    max_depth: usize,
    #[arg(long, help = "Accept the literals null, true and false")]
    keyword_literals: bool,
}

#[derive(Debug)]
enum CliError {
    Read(io::Error),
    Parse(JsonParseError),
    Write(io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Read(e) => write!(f, "could not read input: {e}"),
            CliError::Parse(e) => write!(f, "{e}"),
            CliError::Write(e) => write!(f, "could not write output: {e}"),
        }
    }
}

impl std::error::Error for CliError {}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = read_input(cli.file.as_ref())
        .map_err(CliError::Read)
        .and_then(|input| {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            run(&cli, &input, &mut out)?;
            out.flush().map_err(CliError::Write)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(file: Option<&PathBuf>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    match file {
        Some(path) if path.as_os_str() != "-" => {
            debug!(path = %path.display(), "reading file");
            File::open(path)?.read_to_end(&mut buf)?;
        }
        _ => {
            debug!("reading stdin");
            io::stdin().lock().read_to_end(&mut buf)?;
        }
    }
    Ok(buf)
}

fn run(cli: &Cli, input: &[u8], out: &mut impl Write) -> Result<(), CliError> {
    let config = ParserConfig::default()
        .with_max_depth(cli.max_depth)
        .with_keyword_literals(cli.keyword_literals);
    let parser = JsonParser::new(config);

    let value = if cli.prefix {
        let (value, consumed) = parser.parse(input).map_err(CliError::Parse)?;
        info!("consumed {} of {} bytes", consumed, input.len());
        value
    } else {
        parser.parse_document(input).map_err(CliError::Parse)?
    };

    let mut path = String::from("$");
    write_leaves(out, &mut path, &value).map_err(CliError::Write)
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Writes one line per scalar and per empty container, depth-first. Keys that are not plain
/// identifiers and string values are JSON-quoted.
fn write_leaves(out: &mut impl Write, path: &mut String, value: &JsonValue) -> io::Result<()> {
    let len = path.len();
    match value {
        JsonValue::Array(a) if !a.is_empty() => {
            for (i, item) in a.iter().enumerate() {
                path.push_str(&format!("[{i}]"));
                write_leaves(out, path, item)?;
                path.truncate(len);
            }
        }
        JsonValue::Object(m) if !m.is_empty() => {
            for (key, item) in m.iter() {
                if is_plain_key(key) {
                    path.push('.');
                    path.push_str(key);
                } else {
                    path.push('[');
                    path.push_str(&serde_json::to_string(key).map_err(io::Error::from)?);
                    path.push(']');
                }
                write_leaves(out, path, item)?;
                path.truncate(len);
            }
        }
        JsonValue::Array(_) => writeln!(out, "{path} = []")?,
        JsonValue::Object(_) => writeln!(out, "{path} = {{}}")?,
        JsonValue::Null => writeln!(out, "{path} = null")?,
        JsonValue::Bool(b) => writeln!(out, "{path} = {b}")?,
        JsonValue::Int(n) => writeln!(out, "{path} = {n}")?,
        JsonValue::Double(n) => writeln!(out, "{path} = {n:?}")?,
        JsonValue::String(s) => {
            write!(out, "{path} = ")?;
            serde_json::to_writer(&mut *out, s).map_err(io::Error::from)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
