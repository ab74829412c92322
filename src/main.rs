use std::io::{self, BufRead};
use std::thread;

use clap::Parser;
use loanbook_core::ledger::AccountId;
use loanbook_core::service::LedgerService;

/// Interactive driver for a Loanbook ledger session.
///
/// Commands are read line by line from stdin and applied against an
/// in-memory book; every notification is printed as one JSON line on
/// stdout, rejections go to stderr and the session keeps running.
#[derive(Parser)]
#[command(name = "loanbook", version, about)]
struct Cli {
    /// Identity installed as the ledger owner for this session.
    #[arg(long, default_value = "owner")]
    owner: String,

    /// Suppress the notification stream on stdout.
    #[arg(long)]
    quiet: bool,
}

enum Outcome {
    Continue,
    Quit,
}

fn main() {
    let cli = Cli::parse();
    let service = LedgerService::new(cli.owner.clone());

    if !cli.quiet {
        let events = service.subscribe();
        thread::spawn(move || {
            for event in events {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(err) => eprintln!("event encode error: {err}"),
                }
            }
        });
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                eprintln!("stdin error: {err}");
                break;
            }
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        match run_command(&service, &words) {
            Ok(Outcome::Continue) => {}
            Ok(Outcome::Quit) => break,
            Err(err) => eprintln!("rejected: {err}"),
        }
    }
}

fn run_command(service: &LedgerService, words: &[&str]) -> Result<Outcome, String> {
    match words {
        ["request", borrower, amount, rate, duration] => {
            let borrower: AccountId = (*borrower).to_string();
            let amount = parse_number(amount, "amount")?;
            let rate = parse_number(rate, "rate")?;
            let duration = parse_number(duration, "duration")?;
            service
                .request_loan(&borrower, amount, rate, duration)
                .map_err(|err| err.to_string())?;
            Ok(Outcome::Continue)
        }
        ["approve", caller, borrower] => {
            let caller: AccountId = (*caller).to_string();
            let borrower: AccountId = (*borrower).to_string();
            service
                .approve_loan(&caller, &borrower)
                .map_err(|err| err.to_string())?;
            Ok(Outcome::Continue)
        }
        ["show", borrower] => {
            match service.loan_of(&(*borrower).to_string()) {
                Some(loan) => {
                    let line = serde_json::to_string(&loan).map_err(|err| err.to_string())?;
                    println!("{line}");
                }
                None => println!("null"),
            }
            Ok(Outcome::Continue)
        }
        ["snapshot"] => {
            let snapshot = service.snapshot();
            println!(
                "owner={} loans={} events={} digest={}",
                snapshot.owner,
                snapshot.loans.len(),
                snapshot.events.len(),
                hex::encode(snapshot.digest)
            );
            Ok(Outcome::Continue)
        }
        ["help"] => {
            print_usage();
            Ok(Outcome::Continue)
        }
        ["quit"] | ["exit"] => Ok(Outcome::Quit),
        _ => Err(format!("unknown command: {}", words.join(" "))),
    }
}

fn parse_number(raw: &str, field: &str) -> Result<u64, String> {
    raw.parse()
        .map_err(|_| format!("{field} must be a non-negative integer, got {raw:?}"))
}

fn print_usage() {
    eprintln!(
        "Commands:
  request <borrower> <amount> <rate> <duration>   register a loan request
  approve <caller> <borrower>                     approve a pending loan (owner only)
  show <borrower>                                 print the stored record as JSON
  snapshot                                        print book summary + digest
  help                                            this text
  quit                                            end the session"
    );
}
