#![forbid(unsafe_code)]
//! Demo CLI: seals a short conversation into a chain, optionally corrupts
//! some blocks, then validates the result.

use clap::Parser;
use colored::*;
use linkchain::blockchain::{Block, Chain, Difficulty};
use linkchain::config::{load_config, DEFAULT_CONFIG_PATH};
use linkchain::tamper::Tamper;
use rand::seq::SliceRandom;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const CONVERSATION: &[(&str, &str, &str)] = &[
    ("ada", "grace", "Back from the trip yet? Holidays must be nearly over."),
    ("grace", "ada", "Flying home tomorrow. Please don't mention that school starts in two days."),
    ("ada", "grace", "Two days. Was the trip really that bad?"),
    ("ada", "grace", "Did you get the maths homework done while you were away?"),
    ("linus", "ada", "Can you send me yesterday's homework? Not in the mood to do it myself."),
    ("ada", "linus", "Don't have it either. Asked grace, still waiting for an answer."),
];

const RANDOM_PEOPLE: &[&str] = &[
    "ada", "grace", "linus", "barbara", "ken", "dennis", "margaret", "edsger", "donald", "radia",
    "frances", "alan",
];

const RANDOM_MESSAGES: &[&str] = &[
    "Here is a random message for you.",
    "What a coincidence, right?",
    "Why this coincidence of all things?",
    "Sometimes I wonder whether this is chance.",
    "That was really random the other day.",
    "If he hadn't rolled that number I would have won.",
    "I don't believe in chance, do you?",
    "I do believe in chance, actually.",
    "Did you know a computer cannot produce true randomness?",
    "Probability class is boring.",
    "I wrote a message at random and sent it to you at random.",
    "Maybe I'll win the lottery by chance.",
];

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of leading zeros a block digest must have (default: 4)
    #[arg(short, long)]
    difficulty: Option<u32>,

    /// Number of randomly generated blocks appended after the sample conversation
    #[arg(short = 'z', long = "random", default_value_t = 0)]
    random_blocks: usize,

    /// Corrupt the block at this index after sealing (repeatable)
    #[arg(short = 'm', long = "manipulate")]
    manipulate: Vec<u64>,

    /// Skip chain validation
    #[arg(long)]
    novalid: bool,

    /// Do not print the chain
    #[arg(long)]
    noshow: bool,

    /// Seal with this many threads
    #[arg(short, long)]
    threads: Option<usize>,

    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

fn rounded(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}

fn report_sealed(block: &Block) {
    println!(
        "Sealed block #{}: {} ({})",
        block.index,
        block.digest.bright_white(),
        humantime::format_duration(rounded(block.seal_duration))
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let started = Instant::now();
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(difficulty) = cli.difficulty {
        config.chain.difficulty = Difficulty::new(difficulty)?;
    }
    if let Some(threads) = cli.threads {
        config.sealer.threads = threads;
    }
    let mut chain: Chain = config.build_chain()?;

    println!("{}", "Sealing blocks ...".bright_cyan().bold());
    println!("{}", "============================".bright_cyan());

    let genesis = chain.create_genesis()?;
    report_sealed(genesis);

    for (sender, recipient, payload) in CONVERSATION {
        let block = chain.append(*sender, *recipient, *payload)?;
        report_sealed(block);
    }

    let mut rng = rand::thread_rng();
    for _ in 0..cli.random_blocks {
        let sender = RANDOM_PEOPLE.choose(&mut rng).copied().unwrap_or("anonymous");
        let recipient = RANDOM_PEOPLE.choose(&mut rng).copied().unwrap_or("anonymous");
        let payload = RANDOM_MESSAGES.choose(&mut rng).copied().unwrap_or_default();
        let block = chain.append(sender, recipient, payload)?;
        report_sealed(block);
    }

    for &index in &cli.manipulate {
        let tamper = Tamper::random(&mut rng);
        match tamper.apply_to(&mut chain, index) {
            Ok(()) => println!("{} {}", format!("Block #{} manipulated:", index).yellow(), tamper),
            Err(e) => println!("{}", format!("Block #{}: {}", index, e).red()),
        }
    }

    if !cli.noshow {
        println!("{}", serde_json::to_string_pretty(chain.blocks())?);
    }

    if !cli.novalid {
        println!();
        let report = chain.validate();
        if report.is_valid() {
            println!("{}", "Chain is fully valid!".bright_green().bold());
        } else {
            let count = report.invalid_count();
            let noun = if count == 1 { "block" } else { "blocks" };
            println!(
                "{}",
                format!("Chain has {} invalid {}:", count, noun)
                    .bright_red()
                    .bold()
            );
            for (index, defects) in report.iter() {
                println!("  - Block #{}", index);
                for defect in defects {
                    println!("      {}", defect.to_string().red());
                }
            }
        }
    }

    println!(
        "Runtime: {}",
        humantime::format_duration(rounded(started.elapsed()))
    );
    Ok(())
}
