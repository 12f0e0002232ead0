use clap::{Arg, ArgAction, Command};
use std::process;

use certsweep::{
    config::ScanConfig,
    output::{OutputFormat, ResultPrinter},
    utils::{file_input::targets_from_file, parse_ports, target_parser::TargetParser},
    Scanner,
};
use colored::*;

// Descriptors kept free for stdio, logging and the runtime itself
const RESERVED_FDS: u64 = 100;

// Spawned-but-unfinished dial tasks allowed per admission slot
const PENDING_PER_SLOT: usize = 8;

// Above this many host:port pairs the user is told the scan is large
const LARGE_SCAN_TARGETS: u128 = 1_000_000;

// Ulimit adjustment for Unix systems
#[cfg(unix)]
fn adjust_ulimit_size(ulimit: Option<u64>) -> u64 {
    use rlimit::Resource;

    if let Some(limit) = ulimit {
        if Resource::NOFILE.set(limit, limit).is_ok() {
            log::info!("Increased file descriptor limit to {}", limit);
        } else {
            eprintln!("{}", "[!] ERROR: Failed to set ulimit value.".bright_red());
        }
    }

    match Resource::NOFILE.get() {
        Ok((soft, _)) => soft,
        Err(_) => {
            eprintln!("{}", "[!] WARNING: Could not get file descriptor limit".bright_yellow());
            65535
        }
    }
}

#[cfg(not(unix))]
fn adjust_ulimit_size(_ulimit: Option<u64>) -> u64 {
    65535
}

/// Keep concurrent dials below the descriptor limit
fn infer_concurrency(requested: Option<usize>, fd_limit: u64) -> usize {
    let ceiling = fd_limit.saturating_sub(RESERVED_FDS).max(1) as usize;
    match requested {
        Some(n) if n > ceiling => {
            eprintln!(
                "{} {} {}",
                "[!] Concurrency".bright_yellow(),
                n,
                format!("exceeds the file descriptor limit, lowering to {}", ceiling).bright_yellow()
            );
            ceiling
        }
        Some(n) => n,
        None => ceiling.min(4500),
    }
}

/// Cap on queued dial tasks, so a large CIDR block streams into the scanner
/// instead of spawning every task at once
fn pending_limit(concurrency: usize) -> usize {
    concurrency.max(1).saturating_mul(PENDING_PER_SLOT)
}

async fn wait_for_room(scanner: &Scanner, limit: usize) {
    while scanner.pending() >= limit {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

fn build_cli() -> Command {
    Command::new("certsweep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Concurrent TLS port scanner: collects peer certificates and negotiated cipher suites")
        .arg(
            Arg::new("targets")
                .value_name("TARGET")
                .help("Hosts to scan (hostname, IP, or CIDR)")
                .num_args(1..)
                .required_unless_present("input-file"),
        )
        .arg(
            Arg::new("ports")
                .short('p')
                .long("ports")
                .value_name("PORTS")
                .help("Ports to scan, e.g. 443,8000-8100")
                .default_value("1-1023"),
        )
        .arg(
            Arg::new("concurrency")
                .short('c')
                .long("concurrency")
                .value_name("N")
                .help("Maximum concurrent dials (defaults below the file descriptor limit)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("MS")
                .help("Connect + handshake timeout in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("ciphers")
                .long("ciphers")
                .help("Enumerate accepted cipher suites (one handshake per known suite)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("input-file")
                .short('i')
                .long("input-file")
                .value_name("FILE")
                .help("Read host specs from a file, one per line"),
        )
        .arg(
            Arg::new("output-format")
                .short('o')
                .long("output-format")
                .value_name("FORMAT")
                .help("Output format: text or json")
                .default_value("text"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ulimit")
                .short('u')
                .long("ulimit")
                .value_name("LIMIT")
                .help("Automatically increase ulimit to this value")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Load configuration from a TOML file (default: ~/.certsweep.toml)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v, -vv, -vvv)")
                .action(ArgAction::Count),
        )
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run(matches: clap::ArgMatches) -> anyhow::Result<()> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ScanConfig::from_toml_file(path)?,
        None => ScanConfig::load_default_config(),
    };

    let fd_limit = adjust_ulimit_size(matches.get_one::<u64>("ulimit").copied());
    let requested = matches
        .get_one::<usize>("concurrency")
        .copied()
        .or(config.max_parallel_dials);
    let concurrency = infer_concurrency(requested, fd_limit);
    config.max_parallel_dials = Some(concurrency);

    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.dial_timeout = *timeout;
    }
    if matches.get_flag("ciphers") {
        config.enumerate_cipher_suites = true;
    }
    config.validate()?;

    let ports = parse_ports(matches.get_one::<String>("ports").map(String::as_str).unwrap_or("1-1023"))?;
    let format: OutputFormat = matches
        .get_one::<String>("output-format")
        .map(String::as_str)
        .unwrap_or("text")
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let colored = !matches.get_flag("no-color");
    if !colored {
        colored::control::set_override(false);
    }

    let mut hosts: Vec<String> = matches
        .get_many::<String>("targets")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if let Some(path) = matches.get_one::<String>("input-file") {
        hosts.extend(targets_from_file(path)?);
    }

    let printer = ResultPrinter::new(format, colored);
    let result_printer = printer.clone();
    let scanner = Scanner::new(config, move |result| {
        println!("{}", result_printer.render(&result));
    })?;

    let parser = TargetParser::default();
    let limit = pending_limit(concurrency);
    let mut enqueue_error = None;
    for host in &hosts {
        match parser.parse_target(host) {
            Ok(parsed) => {
                let total = parsed.hosts.len() as u128 * ports.len() as u128;
                if total > LARGE_SCAN_TARGETS {
                    eprintln!(
                        "{} {} expands to {} targets",
                        "[!] WARNING:".bright_yellow(),
                        parsed.original,
                        total
                    );
                }
                for target in parsed.targets(&ports) {
                    wait_for_room(&scanner, limit).await;
                    scanner.enqueue(target)?;
                }
            }
            Err(e) => {
                eprintln!("{} {}", "[!]".bright_red(), e);
                enqueue_error.get_or_insert(e);
            }
        }
    }

    // Targets already enqueued still run to completion
    scanner.close_and_await_termination().await;
    eprintln!("{}", printer.render_summary(&scanner.stats()));

    match enqueue_error {
        Some(e) if scanner.stats().targets_enqueued == 0 => Err(e.into()),
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    if let Err(e) = run(matches).await {
        eprintln!("{} {:#}", "[!] Error:".bright_red(), e);
        process::exit(1);
    }
}
