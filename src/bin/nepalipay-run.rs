use anyhow::Result;
use nepalipay_runner::{Outcome, run};
use std::process::exit;

fn main() -> Result<()> {
    let outcome = run()?;
    if !matches!(outcome, Outcome::Success) {
        println!("{outcome}");
    }
    exit(outcome.exit_code());
}
