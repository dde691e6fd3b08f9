//! credsweep CLI - sequential credential verification for authorized testing.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use thiserror::Error;

use credsweep::{
    AttemptEngine, CancelToken, CredentialSweep, EventHandler, HttpSession, MarkerClassifier,
    MarkerRules, ProfileError, RulesError, SessionConfig, SweepConfig, SweepEvent, SweepOutcome,
    TargetProfile, TransportError, UserAgentChoice, Wordlist, WordlistError,
};

/// Sequential credential-verification engine for authorized login testing
#[derive(Parser, Debug)]
#[command(name = "credsweep", about = "Test a candidate list against one account, slowly", version)]
struct Args {
    /// Account identifier (email/username) to test
    #[arg(short = 'e', long)]
    identifier: Option<String>,

    /// Path to the candidate wordlist
    #[arg(short, long)]
    wordlist: Option<PathBuf>,

    /// Delay between attempts (seconds)
    #[arg(short, long, default_value_t = 2.0)]
    delay: f64,

    /// Maximum number of attempts (0 for unlimited)
    #[arg(short, long, default_value_t = 0)]
    max_attempts: u32,

    /// Halt the whole sweep on the first checkpoint/challenge response
    #[arg(long)]
    halt_on_block: bool,

    /// Verify TLS certificates (permissive by default for lab targets)
    #[arg(long)]
    verify_tls: bool,

    /// Fixed user-agent string instead of a random pool entry
    #[arg(long)]
    user_agent: Option<String>,

    /// Custom classifier marker rules (JSON file)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Custom target profile (JSON file)
    #[arg(long)]
    target: Option<PathBuf>,

    /// Skip the login-page prefetch (hidden form field extraction)
    #[arg(long)]
    no_prefetch: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("identifier and wordlist path are required")]
    MissingInput,
    #[error("delay must be a finite number of seconds >= 0 (got {0})")]
    InvalidDelay(f64),
    #[error(transparent)]
    Wordlist(#[from] WordlistError),
    #[error(transparent)]
    Rules(#[from] RulesError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(args).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    display_banner();

    if !acknowledge_authorized_use()? {
        println!("Exiting. Only use this tool with proper authorization.");
        return Ok(());
    }

    if !args.delay.is_finite() || args.delay < 0.0 {
        return Err(CliError::InvalidDelay(args.delay));
    }
    let delay = Duration::from_secs_f64(args.delay);

    let identifier = match args.identifier {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => prompt("Enter account identifier (email/username):")?,
    };
    let wordlist_path = match args.wordlist {
        Some(path) => path,
        None => PathBuf::from(prompt("Enter wordlist path:")?),
    };
    if identifier.is_empty() || wordlist_path.as_os_str().is_empty() {
        return Err(CliError::MissingInput);
    }

    let wordlist = Wordlist::load(&wordlist_path)?;
    log::info!(
        "loaded {} candidate(s) from {}",
        wordlist.len(),
        wordlist_path.display()
    );
    log::info!("rate limiting: {:.1} second(s) between attempts", args.delay);
    if wordlist.is_empty() {
        log::warn!("wordlist contains no usable candidates");
    }

    println!("\nYou are about to test: {}", identifier);
    println!("Using wordlist: {}", wordlist_path.display());
    let confirmation = prompt("Type 'CONFIRM' to proceed:")?;
    if confirmation != "CONFIRM" {
        println!("Operation cancelled by user.");
        return Ok(());
    }

    let rules = match args.rules {
        Some(path) => MarkerRules::from_json_file(path)?,
        None => MarkerRules::default(),
    };
    let target = match args.target {
        Some(path) => TargetProfile::from_json_file(path)?,
        None => TargetProfile::default(),
    };

    let session = HttpSession::new(SessionConfig {
        user_agent: args
            .user_agent
            .map(UserAgentChoice::Fixed)
            .unwrap_or_default(),
        verify_tls: args.verify_tls,
        ..SessionConfig::default()
    })?;
    log::info!("session user-agent: {}", session.user_agent());

    let mut engine = AttemptEngine::new(identifier, target, session, MarkerClassifier::new(rules));
    if !args.no_prefetch {
        engine.prefetch_login_form().await;
    }

    let config = SweepConfig {
        delay,
        max_attempts: args.max_attempts,
        halt_on_block: args.halt_on_block,
    };
    let mut sweep =
        CredentialSweep::new(config, engine).with_handler(Arc::new(ConsoleProgress));

    install_interrupt_handler(sweep.cancel_token());

    println!("\n{}", "=".repeat(60));
    println!("Starting authorized testing...");
    println!("{}\n", "=".repeat(60));

    let started = Instant::now();
    let outcome = sweep.run(wordlist.into_candidates()).await;
    let elapsed = started.elapsed();

    println!("\n{}", "=".repeat(60));
    match &outcome {
        SweepOutcome::Found(candidate) => {
            println!("TEST COMPLETE - Valid candidate found: {}", candidate);
        }
        SweepOutcome::Exhausted => {
            println!("TEST COMPLETE - No valid candidate found in the list");
        }
        SweepOutcome::BudgetReached => {
            println!("TEST COMPLETE - Attempt budget reached");
        }
        SweepOutcome::Interrupted => {
            println!("TEST INTERRUPTED - Stopped at a safe point");
        }
    }
    println!("Attempts made: {}", sweep.attempts_made());
    println!("Time elapsed: {:.2} seconds", elapsed.as_secs_f64());
    println!("{}", "=".repeat(60));

    Ok(())
}

/// Ctrl-C trips the token; the sweep stops at its next safe point.
fn install_interrupt_handler(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupt received, stopping at the next safe point");
            cancel.cancel();
        }
    });
}

/// Single-line progress display, overwritten in place.
struct ConsoleProgress;

impl EventHandler for ConsoleProgress {
    fn handle(&self, event: &SweepEvent) {
        if let SweepEvent::Progress(progress) = event {
            print!("\rProgress: {}/{}", progress.attempts_made, progress.total);
            let _ = io::stdout().flush();
        }
    }
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{} ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn display_banner() {
    println!(
        r#"
    +===============================================+
    |        CREDSWEEP  LOGIN SECURITY TESTER       |
    +===============================================+
    | WARNING: For authorized testing only!         |
    |                                               |
    | Legal Use Cases:                              |
    | - Testing your own accounts                   |
    | - Authorized penetration testing              |
    | - Educational purposes                        |
    |                                               |
    | Illegal Use:                                  |
    | - Unauthorized access to others' accounts     |
    | - Brute force attacks without permission      |
    +===============================================+
    "#
    );
}

fn acknowledge_authorized_use() -> io::Result<bool> {
    println!("{}", "=".repeat(60));
    println!("LEGAL ACKNOWLEDGMENT REQUIRED");
    println!("{}", "=".repeat(60));
    println!("By continuing, you confirm that:");
    println!("1. You own the account being tested OR");
    println!("2. You have explicit written permission to test the account");
    println!("3. You understand unauthorized access is illegal");
    println!("{}", "=".repeat(60));

    let answer = prompt("\nDo you confirm these conditions? (yes/no):")?;
    Ok(answer.eq_ignore_ascii_case("yes"))
}
