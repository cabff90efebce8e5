use std::{error::Error, path::PathBuf, process::ExitCode};

use chainbok::{Ledger, Store, VerifyOptions, format_amount, store::DEFAULT_FILE};
use clap::{Parser, Subcommand};
use flate2::Compression;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Hash-chained income and expense ledger")]
struct ChainbokArgs {
    /// Ledger file
    #[arg(long, env = "CHAINBOK_FILE", default_value = DEFAULT_FILE, global = true)]
    file: PathBuf,

    /// Gzip the ledger file when saving
    #[arg(long, env = "CHAINBOK_COMPRESS", global = true)]
    compress: bool,

    /// Do not inspect the genesis entry when verifying
    #[arg(long, global = true)]
    skip_genesis_check: bool,

    #[command(subcommand)]
    command: ChainbokCommand,
}

#[derive(Subcommand)]
enum ChainbokCommand {
    /// Record a transaction, negative amounts are expenses
    Add {
        description: String,
        #[arg(allow_hyphen_values = true)]
        amount: f64,
    },
    /// List all transactions and the balance
    Log,
    /// Print the balance
    Balance,
    /// Check the chain for tampering
    Verify,
    /// Print every field of one entry
    Show {
        index: usize,
        /// Also print the hex encoded hash preimage
        #[arg(long)]
        preimage: bool,
    },
    /// Delete all transactions
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

impl ChainbokArgs {
    fn store(&self) -> Store {
        let store = Store::new(&self.file);
        if self.compress {
            store.with_compression(Compression::default())
        } else {
            store
        }
    }

    fn verify_options(&self) -> VerifyOptions {
        VerifyOptions {
            check_genesis: !self.skip_genesis_check,
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,chainbok=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = ChainbokArgs::parse();
    let store = args.store();

    if let ChainbokCommand::Reset { yes } = args.command {
        if !yes {
            eprintln!("refusing to delete all transactions without --yes");
            return Ok(ExitCode::FAILURE);
        }
        store.save(&Ledger::create())?;
        info!(path = ?store.path(), "ledger reset");
        println!("All transactions have been deleted.");
        return Ok(ExitCode::SUCCESS);
    }

    // A file that exists but does not load is never replaced
    let mut ledger = match store.try_load() {
        Ok(ledger) => ledger.unwrap_or_else(Ledger::create),
        Err(error) => {
            eprintln!("ledger file rejected: {error}");
            return Ok(ExitCode::FAILURE);
        }
    };

    match &args.command {
        ChainbokCommand::Add {
            description,
            amount,
        } => {
            let row = ledger.append(description, *amount)?.show_row();
            store.save(&ledger)?;
            println!("{row}");
        }
        ChainbokCommand::Log => {
            for entry in ledger.transactions() {
                println!("{}", entry.show_row());
            }
            print_balance(&ledger);
        }
        ChainbokCommand::Balance => print_balance(&ledger),
        ChainbokCommand::Verify => {
            let verification = ledger.verify_with(args.verify_options());
            if verification.is_valid() {
                println!("chain valid ({} entries)", ledger.len());
            } else {
                for fault in verification.faults() {
                    println!("{fault}");
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        ChainbokCommand::Show { index, preimage } => {
            let Some(entry) = ledger.get(*index) else {
                eprintln!("no entry at index {index}, ledger has {}", ledger.len());
                return Ok(ExitCode::FAILURE);
            };
            print!("{}", entry.show_long());
            if *preimage {
                let mut buffer = Vec::new();
                entry.write_canonical(&mut buffer)?;
                println!("preimage:      {}", hex::encode(buffer));
            }
        }
        ChainbokCommand::Reset { .. } => unreachable!("handled before loading"),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_balance(ledger: &Ledger) {
    println!("Balance: {}", format_amount(ledger.balance()));
}
