use clap::{Parser, Subcommand};
use kv_probe::probe::{self, Report};
use kv_probe::{KvClient, ProbeConfig, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::exit;
use tracing::{debug, Level};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Probe a Key-Value store with a fixed command sequence", long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Option<SubCommand>,

    #[clap(long)]
    #[clap(help = "JSON file with the store's host and port")]
    config: Option<PathBuf>,

    #[clap(long)]
    #[clap(help = "Store host, overrides the config file")]
    host: Option<String>,

    #[clap(long)]
    #[clap(help = "Store port, overrides the config file")]
    port: Option<u16>,

    #[clap(long)]
    #[clap(help = "Print the report as JSON")]
    json: bool,

    #[clap(short, long)]
    #[clap(help = "Log every command sent")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    #[clap(about = "SET, GET, DEL, then GET the same key (default)")]
    Strings {
        #[clap(long, default_value = "c")]
        #[clap(help = "The string key")]
        key: String,
        #[clap(long, default_value = "xxxxx")]
        #[clap(help = "The value assigned to key")]
        value: String,
    },

    #[clap(about = "HSET some fields, then HGETALL")]
    Hash {
        #[clap(long, default_value = "hhh")]
        #[clap(help = "The hash key")]
        key: String,
        #[clap(help = "Fields as FIELD=VALUE", parse(try_from_str = parse_field))]
        fields: Vec<(String, String)>,
    },

    #[clap(about = "LPUSH some values, then LRANGE 0 -1")]
    List {
        #[clap(long, default_value = "mylist")]
        #[clap(help = "The list key")]
        key: String,
        #[clap(help = "Values to push")]
        values: Vec<String>,
    },
}

fn parse_field(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, val)) if !field.is_empty() => Ok((field.to_owned(), val.to_owned())),
        _ => Err(format!("expected FIELD=VALUE, got {:?}", s)),
    }
}

fn main() {
    let args = Args::parse();

    // logs go to stderr, stdout only carries the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    if let Err(error) = run(args) {
        eprintln!("{}", error);
        exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    }
    .with_overrides(args.host, args.port);
    debug!("Using store at {}", config.addr());

    let mut client = KvClient::connect(config.addr())?;

    let command = args.command.unwrap_or(SubCommand::Strings {
        key: "c".to_owned(),
        value: "xxxxx".to_owned(),
    });

    match command {
        SubCommand::Strings { key, value } => {
            emit(&probe::run_strings(&mut client, &key, &value)?, args.json)
        }

        SubCommand::Hash { key, mut fields } => {
            if fields.is_empty() {
                fields = vec![
                    ("name".to_owned(), "sxc".to_owned()),
                    ("sex".to_owned(), "19".to_owned()),
                ];
            }
            emit(&probe::run_hash(&mut client, &key, &fields)?, args.json)
        }

        SubCommand::List { key, mut values } => {
            if values.is_empty() {
                values = vec!["111".to_owned(), "222".to_owned(), "333".to_owned()];
            }
            emit(&probe::run_list(&mut client, &key, &values)?, args.json)
        }
    }
}

// print the report, then fail if the store broke the probe's contract
fn emit<R: Report>(report: &R, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer(&mut out, report)?;
        writeln!(out)?;
    } else {
        report.render(&mut out)?;
    }
    out.flush()?;

    report.verify()
}
