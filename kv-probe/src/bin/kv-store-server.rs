use clap::Parser;
use kv_probe::thread_pool::{SharedQueueThreadPool, ThreadPool};
use kv_probe::{KvServer, MemoryStore, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process::exit;
use tracing::{error, info, Level};

#[derive(Parser, Debug)]
#[clap(author, version, about = "In-memory Key-Value store speaking RESP", long_about = None)]
struct Args {
    #[clap(long)]
    #[clap(
        default_value_t = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 6379))
    ]
    #[clap(help = "Socket Address to bind this server to")]
    addr: SocketAddr,

    #[clap(long, default_value_t = 4)]
    #[clap(help = "Number of worker threads serving connections")]
    threads: usize,

    #[clap(short, long)]
    #[clap(help = "Log every command served")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // set log collector
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    info!("Application Started: Version {}", env!("CARGO_PKG_VERSION"));

    if let Err(error) = run(args) {
        error!("{}", error);
        exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let pool = SharedQueueThreadPool::new(args.threads)?;
    let server = KvServer::new(args.addr, MemoryStore::new(), pool)?;
    server.run()
}
