//! protobox CLI
//!
//! Converts a boxed message between binary (hex), JSON and text.
//!
//! Usage: `protobox-cli [--config <path.yaml>] <input-file | ->`

use std::io::Read;
use std::process::ExitCode;
use std::{env, fs, io};

use tracing_subscriber::{fmt, EnvFilter};

use protobox_cli::{config, convert};
use protobox_core::Registry;

const DEFAULT_CONFIG: &str = "protobox.yaml";

struct Args {
    config: String,
    input: String,
}

fn parse_args() -> Result<Args, String> {
    let mut config = DEFAULT_CONFIG.to_string();
    let mut input = None;
    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => config = it.next().ok_or("--config needs a path")?,
            _ if input.is_none() => input = Some(arg),
            _ => return Err(format!("unexpected argument {arg:?}")),
        }
    }
    let input = input.ok_or("missing input file")?;
    Ok(Args { config, input })
}

fn read_input(path: &str) -> io::Result<String> {
    if path == "-" {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        return Ok(s);
    }
    fs::read_to_string(path)
}

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}\nusage: protobox-cli [--config <path.yaml>] <input-file | ->");
            return ExitCode::from(2);
        }
    };

    let cfg = match config::load_from_file(&args.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(path = %args.config, code = e.code().as_str(), "config load failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    let input = match read_input(&args.input) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(path = %args.input, "read input failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(from = ?cfg.convert.from, to = ?cfg.convert.to, "protobox-cli converting");
    match convert::convert(
        cfg.convert.from,
        cfg.convert.to,
        &input,
        Registry::global(),
        cfg.decode,
    ) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = e.code().as_str(), "conversion failed: {e}");
            eprintln!("{}: {e}", e.code().as_str());
            ExitCode::FAILURE
        }
    }
}
