mod batch;

use clap::{Arg, ArgAction, ArgMatches, Command};
use sha2::{Digest, Sha256};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use std::{path::PathBuf, process};

use crypto::dh::DhParameters;
use crypto::{Algorithm, CipherConfig, Mode, Padding};

use batch::{Batch, Direction};

const DEFAULT_THREADS: &str = "4";
const DEFAULT_PRIME_BITS: &str = "512";

fn hash_key(key: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let result = hasher.finalize();
    let mut hash_array = [0u8; 32];
    hash_array.copy_from_slice(&result);

    hash_array
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}

fn cipher_args(cmd: Command) -> Command {
    let algorithms: Vec<&'static str> = Algorithm::ALL.iter().map(|a| a.as_str()).collect();
    let modes: Vec<&'static str> = Mode::ALL.iter().map(|m| m.as_str()).collect();
    let paddings: Vec<&'static str> = Padding::ALL.iter().map(|p| p.as_str()).collect();

    cmd.arg(Arg::new("algorithm")
            .short('a')
            .long("algorithm")
            .value_parser(algorithms)
            .default_value("twofish")
            .help("Block cipher"))
        .arg(Arg::new("mode")
            .short('m')
            .long("mode")
            .value_parser(modes)
            .default_value("CBC")
            .help("Mode of operation"))
        .arg(Arg::new("padding")
            .short('p')
            .long("padding")
            .value_parser(paddings)
            .default_value("PKCS7")
            .help("Padding scheme"))
        .arg(Arg::new("key")
            .short('k')
            .long("key")
            .num_args(1)
            .required(true)
            .help("Passphrase, hashed with SHA-256 into a 32 byte key"))
        .arg(Arg::new("raw-key")
            .long("raw-key")
            .action(ArgAction::SetTrue)
            .help("Use the passphrase bytes as the key without hashing"))
        .arg(Arg::new("threads")
            .short('T')
            .long("threads")
            .value_parser(clap::value_parser!(usize))
            .default_value(DEFAULT_THREADS)
            .help("Number of worker threads"))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .num_args(1)
            .required(true)
            .help("Directory for the produced files"))
        .arg(Arg::new("source")
            .num_args(1..)
            .required(true)
            .value_parser(clap::value_parser!(PathBuf))
            .help("Files or directories to process"))
}

fn cli() -> Command {
    Command::new("blockcrypt")
        .about("Encrypts and decrypts files with RC5 or Twofish and runs a Diffie-Hellman key agreement")
        .subcommand_required(true)
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .global(true)
            .action(ArgAction::SetTrue)
            .help("Log every encrypt and decrypt call"))
        .subcommand(cipher_args(Command::new("encrypt")
            .about("Encrypt files; each output starts with its random IV")))
        .subcommand(cipher_args(Command::new("decrypt")
            .about("Decrypt files produced by encrypt")))
        .subcommand(Command::new("exchange")
            .about("Agree on a key between two local parties and print it in hex")
            .arg(Arg::new("bits")
                .short('b')
                .long("bits")
                .value_parser(clap::value_parser!(usize))
                .default_value(DEFAULT_PRIME_BITS)
                .help("Prime size in bits, 16 to 2048")))
}

fn run_batch(direction: Direction, matches: &ArgMatches) -> Result<bool, String> {
    let arg = |name: &str| matches.get_one::<String>(name).cloned().unwrap_or_default();

    let config = CipherConfig::parse(&arg("algorithm"), &arg("mode"), &arg("padding"))
        .map_err(|e| e.to_string())?;

    let passphrase = arg("key");
    let key = if matches.get_flag("raw-key") {
        passphrase.into_bytes()
    } else {
        hash_key(&passphrase).to_vec()
    };

    let threads = *matches.get_one::<usize>("threads").unwrap_or(&4);
    let output = PathBuf::from(arg("output"));
    let sources: Vec<PathBuf> = matches.get_many::<PathBuf>("source")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let results = Batch::new(config, key, threads)
        .run(direction, &sources, &output)
        .map_err(|e| e.to_string())?;

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        error!(failed, total = results.len(), "some files were not processed");
    }

    Ok(failed == 0)
}

fn run_exchange(matches: &ArgMatches) -> Result<bool, String> {
    let bits = *matches.get_one::<usize>("bits").unwrap_or(&512);

    info!(bits, "generating prime");
    let alice = DhParameters::generate(bits).map_err(|e| e.to_string())?;
    let bob = DhParameters::from_prime(alice.prime).map_err(|e| e.to_string())?;

    let alice_key = alice.hashed_key(&bob.public_key).map_err(|e| e.to_string())?;
    let bob_key = bob.hashed_key(&alice.public_key).map_err(|e| e.to_string())?;

    if alice_key != bob_key {
        return Err("parties derived different keys".to_string());
    }

    println!("{}", hex::encode(alice_key));

    Ok(true)
}

fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let result = match matches.subcommand() {
        Some(("encrypt", sub)) => run_batch(Direction::Encrypt, sub),
        Some(("decrypt", sub)) => run_batch(Direction::Decrypt, sub),
        Some(("exchange", sub)) => run_exchange(sub),
        _ => Err("unknown command".to_string()),
    };

    match result {
        Ok(true) => info!("done"),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    }
}
