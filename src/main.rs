// Entry point and high-level CLI flow.
//
// - `report` runs one turnover report for a selection given on the command
//   line and writes the chart properties, records and a JSON summary.
// - `suppliers` lists the supplier master, optionally filtered.
// - `menu` is an interactive loop that keeps the selection and the charts of
//   earlier runs in memory until the user clears them or exits.
mod color;
mod config;
mod error;
mod filter;
mod normalize;
mod output;
mod query;
mod reports;
mod selection;
mod style;
mod types;
mod util;

use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use log::info;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use config::Settings;
use error::Result;
use query::FileQueryExecutor;
use reports::{ReportOutcome, ReportSession, NO_DATA_MESSAGE};
use types::{PeriodMode, ReportKind, Selection, SupplierMaster};

#[derive(Parser)]
#[command(
    name = "turnover-report",
    about = "Supplier turnover reports with chart color rules."
)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory with one JSON or CSV file per entity set
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<String>,
    /// Directory report files are written to
    #[arg(long = "out", global = true)]
    output_dir: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one report and export its chart properties.
    Report {
        #[arg(long, value_enum, default_value_t = ReportKind::AllSuppliers)]
        kind: ReportKind,
        #[arg(long, value_enum, default_value_t = PeriodMode::FiscalYearWise)]
        mode: PeriodMode,
        /// Fiscal years, comma separated
        #[arg(long = "fiscal-year", value_delimiter = ',')]
        fiscal_years: Vec<String>,
        /// Quarters, comma separated (e.g. Q1,Q2)
        #[arg(long = "quarter", value_delimiter = ',')]
        quarters: Vec<String>,
        /// Quarter years, comma separated
        #[arg(long = "quarter-year", value_delimiter = ',')]
        quarter_years: Vec<String>,
        /// Supplier numbers, comma separated (single supplier report)
        #[arg(long = "supplier", value_delimiter = ',')]
        suppliers: Vec<String>,
    },
    /// List the supplier master.
    Suppliers {
        /// Keep suppliers whose number or name contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Interactive report selection.
    Menu,
}

// In-memory state for the interactive menu so charts and the supplier master
// survive between menu actions.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        session: ReportSession::new(),
        suppliers: None,
    })
});

struct AppState {
    session: ReportSession,
    suppliers: Option<Vec<SupplierMaster>>,
}

fn app_state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|e| e.into_inner())
}

fn init_logging() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        settings.output_dir = dir.clone();
    }
    Ok(settings)
}

/// Fetch the session's current selection and store the result.
fn run_report(session: &mut ReportSession, settings: &Settings) -> Result<()> {
    let executor = FileQueryExecutor::new(&settings.data_dir);
    let ticket = session.begin_fetch();
    let outcome = reports::fetch_report(&executor, &ticket.selection, settings)?;
    print_outcome(&outcome, settings)?;
    session.apply(&ticket, outcome);
    Ok(())
}

/// Print a preview of the report and write its output files.
fn print_outcome(outcome: &ReportOutcome, settings: &Settings) -> Result<()> {
    let report = match outcome {
        ReportOutcome::NoData { .. } => {
            println!("{}\n", NO_DATA_MESSAGE);
            return Ok(());
        }
        ReportOutcome::Chart(report) => report,
    };

    let kind = report.selection.kind;
    let out_dir = Path::new(&settings.output_dir);
    std::fs::create_dir_all(out_dir)?;
    let properties_file = out_dir.join(format!("chart{}_properties.json", report.slot));
    let records_file = out_dir.join(format!("chart{}_records.csv", report.slot));
    let summary_file = out_dir.join("summary.json");

    output::write_json(&properties_file, &report.properties)?;
    output::write_csv(&records_file, &report.records)?;
    let summary = reports::summarize(report);
    output::write_json(&summary_file, &summary)?;

    println!("{} ({})", kind.tab_text(), report.selection.mode.label());
    if let Some(filter) = &report.filter {
        println!("(Filter: {})", filter);
    }
    println!();
    output::preview_table_rows(&reports::preview_rows(report), settings.preview_rows);
    println!(
        "{} records, {} categories, total turnover {} Cr",
        util::format_int(summary.total_records),
        util::format_int(summary.distinct_categories),
        util::format_number(summary.total_turnover_crore, 2)
    );
    println!(
        "(Chart properties exported to {}, records to {})\n",
        properties_file.display(),
        records_file.display()
    );
    info!("Summary written to {}", summary_file.display());
    Ok(())
}

fn handle_suppliers(settings: &Settings, search: Option<&str>) -> Result<Vec<SupplierMaster>> {
    let executor = FileQueryExecutor::new(&settings.data_dir);
    let suppliers = query::load_supplier_master(&executor)?;
    let hits: Vec<SupplierMaster> = query::search_suppliers(&suppliers, search.unwrap_or(""))
        .into_iter()
        .cloned()
        .collect();
    output::preview_table_rows(&hits, hits.len());
    Ok(suppliers)
}

/// Read one trimmed line after printing `label`. `None` on end of input.
fn prompt(label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask the user whether to go back to the report selection menu after
/// generating a report. `false` means exit.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = prompt("Back to Report Selection (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Collect a selection interactively, starting from the previous one.
fn prompt_selection(previous: &Selection) -> Option<Selection> {
    println!("Report:");
    for (i, kind) in ReportKind::ALL.iter().enumerate() {
        println!("[{}] {}", i + 1, kind.tab_text());
    }
    let kind = loop {
        let choice = prompt("Enter choice: ")?;
        match ReportKind::from_tab_key(&format!("scenario{choice}")) {
            Ok(kind) => break kind,
            Err(_) => println!("Invalid choice. Please enter 1 to 4."),
        }
    };
    println!("[0] Fiscal Year Wise\n[1] Quarterly Wise");
    let mode = loop {
        let choice = prompt("Enter choice: ")?;
        match choice.parse().map(PeriodMode::from_radio_index) {
            Ok(Ok(mode)) => break mode,
            _ => println!("Invalid choice. Please enter 0 or 1."),
        }
    };

    let mut selection = Selection::new(kind, mode);
    if kind == ReportKind::SingleSupplier {
        let ids = prompt(&format!(
            "Supplier numbers [{}]: ",
            previous.supplier_ids.join(", ")
        ))?;
        let ids = keep_previous(util::parse_list(&ids), &previous.supplier_ids);
        selection = selection.with_suppliers(ids);
    }
    match mode {
        PeriodMode::FiscalYearWise => {
            let years = prompt(&format!(
                "Fiscal years [{}]: ",
                previous.fiscal_years.join(", ")
            ))?;
            selection.fiscal_years = keep_previous(util::parse_list(&years), &previous.fiscal_years);
        }
        PeriodMode::QuarterlyWise => {
            let quarters = prompt(&format!("Quarters [{}]: ", previous.quarters.join(", ")))?;
            selection.quarters = keep_previous(util::parse_list(&quarters), &previous.quarters);
            let years = prompt(&format!(
                "Quarter years [{}]: ",
                previous.quarter_years.join(", ")
            ))?;
            selection.quarter_years = keep_previous(util::parse_list(&years), &previous.quarter_years);
        }
    }
    Some(selection)
}

fn keep_previous(values: Vec<String>, previous: &[String]) -> Vec<String> {
    if values.is_empty() {
        previous.to_vec()
    } else {
        values
    }
}

fn handle_menu_report(settings: &Settings) -> bool {
    let previous = app_state().session.selection.clone();
    let Some(selection) = prompt_selection(&previous) else {
        return false;
    };
    println!();
    let mut state = app_state();
    if let Some(master) = &state.suppliers {
        let names = query::supplier_names(master, &selection.supplier_ids);
        if !names.is_empty() {
            println!("Suppliers: {}\n", names.join(", "));
        }
    }
    state.session.selection = selection;
    if let Err(e) = run_report(&mut state.session, settings) {
        eprintln!("{}\n", e);
    }
    true
}

fn print_charts(session: &ReportSession) {
    for slot in 1..=reports::CHART_SLOTS {
        let state = if session.is_visible(slot) { "shown" } else { "hidden" };
        match session.chart(slot) {
            Some(report) => println!(
                "Chart {}: {}, {} ({}), {} records",
                slot,
                state,
                report.selection.kind.tab_text(),
                report.selection.mode.label(),
                report.records.len()
            ),
            None => println!("Chart {}: {}, empty", slot, state),
        }
    }
    println!();
}

fn run_menu(settings: &Settings) {
    loop {
        println!("Select Report Action:");
        println!("[1] Load supplier master");
        println!("[2] Generate Report");
        println!("[3] Clear selection");
        println!("[4] Show charts\n");
        let Some(choice) = prompt("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => {
                let search = prompt("Search (blank for all): ").unwrap_or_default();
                match handle_suppliers(settings, Some(&search)) {
                    Ok(suppliers) => app_state().suppliers = Some(suppliers),
                    Err(e) => eprintln!("{}\n", e),
                }
            }
            "2" => {
                println!();
                if !handle_menu_report(settings) || !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                let mut state = app_state();
                state.session.clear();
                println!("Selection and charts cleared.\n");
            }
            "4" => print_charts(&app_state().session),
            _ => {
                println!("Invalid choice. Please enter 1 to 4.\n");
            }
        }
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = resolve_settings(&cli).and_then(|settings| match cli.command {
        Commands::Report {
            kind,
            mode,
            fiscal_years,
            quarters,
            quarter_years,
            suppliers,
        } => {
            let mut session = ReportSession::new();
            session.selection = Selection::new(kind, mode)
                .with_fiscal_years(fiscal_years)
                .with_quarters(quarters)
                .with_quarter_years(quarter_years)
                .with_suppliers(suppliers);
            run_report(&mut session, &settings)
        }
        Commands::Suppliers { search } => handle_suppliers(&settings, search.as_deref()).map(|_| ()),
        Commands::Menu => {
            run_menu(&settings);
            Ok(())
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
