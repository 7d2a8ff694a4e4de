//! ImmoSim CLI
//!
//! Loads an input snapshot from JSON, runs the projection, prints a summary
//! to the console, and optionally exports the full bundle as JSON and the
//! consolidated monthly series as CSV.

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;

use immosim::{InputSnapshot, ResultBundle, SimulationEngine};

#[derive(Parser, Debug)]
#[command(name = "immosim", about = "Real-estate cash-flow projection")]
struct Args {
    /// Input snapshot (JSON)
    input: PathBuf,

    /// Write the full result bundle as JSON
    #[arg(long)]
    json_output: Option<PathBuf>,

    /// Write the consolidated monthly series as CSV
    #[arg(long)]
    csv_output: Option<PathBuf>,

    /// Number of monthly rows to print per family
    #[arg(long, default_value_t = 12)]
    detail_rows: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.input)
        .with_context(|| format!("cannot open input file {}", args.input.display()))?;
    let snapshot: InputSnapshot =
        serde_json::from_reader(file).context("input file is not a valid snapshot")?;

    let bundle = SimulationEngine::new().run(&snapshot);
    print_summary(&bundle, args.detail_rows);

    if let Some(path) = &args.json_output {
        let file = File::create(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        serde_json::to_writer_pretty(file, &bundle).context("cannot serialize bundle")?;
        println!("\nFull bundle written to: {}", path.display());
    }

    if let Some(path) = &args.csv_output {
        write_monthly_csv(&bundle, path)
            .with_context(|| format!("cannot write {}", path.display()))?;
        println!("\nMonthly series written to: {}", path.display());
    }

    Ok(())
}

fn print_summary(bundle: &ResultBundle, detail_rows: usize) {
    let s = &bundle.summary;

    println!("ImmoSim v0.1.0");
    println!("==============\n");

    println!("Rental income ({} leases):", s.nb_baux);
    println!("  Base rent:        {:>14.2}", s.total_loyers_base);
    println!("  Indexed rent:     {:>14.2}", s.total_loyers_idx);
    println!("  IRL-indexed rent: {:>14.2}", s.total_loyers_irl);
    println!("  Charges:          {:>14.2}", s.total_charges);
    println!("  Gross total:      {:>14.2}", s.total_brut);
    println!("  GLI insurance:    {:>14.2}", s.total_frais_gli);
    println!("  Net total:        {:>14.2}", s.total_net);
    println!("  Net ratio:        {:>14.4}", s.rentabilite_nette);

    println!("\nDebt service ({} loans):", s.nb_prets);
    println!("  Payments:         {:>14.2}", s.total_paiements);
    println!("  Principal:        {:>14.2}", s.total_principal);
    println!("  Interest:         {:>14.2}", s.total_interets);
    println!("  Fees:             {:>14.2}", s.total_frais);
    println!("  Total cost:       {:>14.2}", s.cout_total_credit);
    println!("  Avg monthly:      {:>14.2}", s.paiement_mensuel_moyen);

    let coherence = &bundle.loans.coherence;
    if coherence.has_zero_month_gap() || coherence.has_high_variation() {
        println!("\nCoherence warnings:");
        if coherence.has_zero_month_gap() {
            println!("  {} months without any loan payment", coherence.zero_months);
        }
        if coherence.has_high_variation() {
            println!("  monthly payment variation {:.1}%", coherence.variation_pct);
        }
    }

    if !bundle.rent.consolidated_monthly.is_empty() {
        println!("\nRent, first {} months:", detail_rows);
        println!("{:>8} {:>12} {:>12} {:>12} {:>12}", "Month", "Indexed", "Charges", "Gross", "Net");
        println!("{}", "-".repeat(62));
        for (month, row) in bundle.rent.consolidated_monthly.iter().take(detail_rows) {
            println!(
                "{:>8} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
                month.to_string(),
                row.indexed,
                row.charges,
                row.gross,
                row.net
            );
        }
        let remaining = bundle.rent.consolidated_monthly.len().saturating_sub(detail_rows);
        if remaining > 0 {
            println!("... ({} more months)", remaining);
        }
    }

    if !bundle.loans.monthly.is_empty() {
        println!("\nDebt service, first {} months:", detail_rows);
        println!("{:>8} {:>12} {:>12} {:>12} {:>12}", "Month", "Payment", "Principal", "Interest", "Fees");
        println!("{}", "-".repeat(62));
        for (month, row) in bundle.loans.monthly.iter().take(detail_rows) {
            println!(
                "{:>8} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
                month.to_string(),
                row.payment,
                row.principal,
                row.interest,
                row.fees
            );
        }
        let remaining = bundle.loans.monthly.len().saturating_sub(detail_rows);
        if remaining > 0 {
            println!("... ({} more months)", remaining);
        }
    }

    for error in &bundle.errors {
        eprintln!("stage error: {error}");
    }
}

/// One CSV row per month over the union of both monthly series
fn write_monthly_csv(bundle: &ResultBundle, path: &PathBuf) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "month",
        "loyer_base",
        "loyer_idx",
        "loyer_irl",
        "charges",
        "brut",
        "frais_gli",
        "net",
        "paiement",
        "principal",
        "interets",
        "frais",
    ])?;

    let months: std::collections::BTreeSet<_> = bundle
        .rent
        .consolidated_monthly
        .keys()
        .chain(bundle.loans.monthly.keys())
        .copied()
        .collect();

    for month in months {
        let rent = bundle.rent.consolidated_monthly.get(&month).copied().unwrap_or_default();
        let loan = bundle.loans.monthly.get(&month).copied().unwrap_or_default();
        writer.write_record([
            month.to_string(),
            format!("{:.2}", rent.base),
            format!("{:.2}", rent.indexed),
            format!("{:.2}", rent.reference_indexed),
            format!("{:.2}", rent.charges),
            format!("{:.2}", rent.gross),
            format!("{:.2}", rent.insurance),
            format!("{:.2}", rent.net),
            format!("{:.2}", loan.payment),
            format!("{:.2}", loan.principal),
            format!("{:.2}", loan.interest),
            format!("{:.2}", loan.fees),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
