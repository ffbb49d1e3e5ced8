//! CLI definition and dispatch.

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::chart_svg::Visualizer;
use crate::adapters::csv_adapter::{CsvEngineAdapter, write_summary_csv};
use crate::adapters::default_catalog::load_catalog;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::domain::catalog::Catalog;
use crate::domain::collector::{
    FIELD_CASH, FIELD_END, FIELD_POOL, FIELD_START, FIELD_STRATEGY, FIELD_SUBMIT, FormInput,
    collect_backtest_form,
};
use crate::domain::error::TrendQuestError;
use crate::domain::format::{decimal, percent};
use crate::domain::settings::AppSettings;
use crate::logging::init_logging;
use crate::pipeline::Pipeline;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT: &str = "report.html";

#[derive(Parser, Debug)]
#[command(name = "trendquest", about = "Pool backtest configuration and reporting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web UI
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run a backtest over a stock pool and write the report
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        pool: String,
        #[arg(short, long)]
        strategy: String,
        /// Start date (YYYY-MM-DD), one year before the end date by default
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD), today by default
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        cash: Option<String>,
        /// Strategy parameter as NAME=VALUE, repeatable
        #[arg(long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the per-symbol summary as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// List strategies and their parameters
    Strategies {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List stock pools and their symbols
    Pools {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(config.as_deref()),
        Command::Backtest {
            config,
            pool,
            strategy,
            start,
            end,
            cash,
            params,
            output,
            csv,
        } => {
            let args = BacktestArgs {
                pool,
                strategy,
                start,
                end,
                cash,
                params,
                output: output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
                csv,
            };
            run_backtest(config.as_deref(), &args)
        }
        Command::Strategies { config } => run_strategies(config.as_deref()),
        Command::Pools { config } => run_pools(config.as_deref()),
    }
}

/// Read the INI file, or an empty configuration when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, ExitCode> {
    let result = match path {
        Some(p) => FileConfigAdapter::from_file(p),
        None => FileConfigAdapter::from_string(""),
    };
    result.map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// Everything a command needs: settings, catalog, logging installed.
pub struct Context {
    pub settings: AppSettings,
    pub catalog: Catalog,
}

pub fn load_context(path: Option<&Path>) -> Result<Context, ExitCode> {
    let config = load_config(path)?;
    let settings = AppSettings::from_config(&config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    init_logging(settings.log_filter.as_deref());
    if let Some(p) = path {
        tracing::info!(path = %p.display(), "config loaded");
    }

    let catalog = load_catalog(&config).map_err(|e| {
        tracing::error!(error = %e, "failed to load catalog");
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok(Context { settings, catalog })
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Charts and default dates anchor on the configured reference date, if any.
pub fn visualizer_for(settings: &AppSettings) -> Visualizer {
    let reference = settings
        .reference_date
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_else(now);
    Visualizer::new(reference)
}

#[derive(Debug, Clone)]
pub struct BacktestArgs {
    pub pool: String,
    pub strategy: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub cash: Option<String>,
    pub params: Vec<String>,
    pub output: PathBuf,
    pub csv: Option<PathBuf>,
}

/// Translate command-line arguments into the same field set the web form
/// submits. Parameter names must be declared by the strategy.
pub fn form_input(catalog: &Catalog, args: &BacktestArgs) -> Result<FormInput, TrendQuestError> {
    catalog.pools.get(&args.pool)?;
    let strategy = catalog.strategies.get(&args.strategy)?;

    let mut input = FormInput::default()
        .with(FIELD_POOL, args.pool.as_str())
        .with(FIELD_STRATEGY, strategy.code.as_str())
        .with(FIELD_SUBMIT, "1");
    for (field, value) in [
        (FIELD_START, &args.start),
        (FIELD_END, &args.end),
        (FIELD_CASH, &args.cash),
    ] {
        if let Some(v) = value {
            input = input.with(field, v.as_str());
        }
    }

    for raw in &args.params {
        let Some((name, value)) = raw.split_once('=') else {
            return Err(TrendQuestError::invalid_request(format!(
                "parameter '{raw}' is not NAME=VALUE"
            )));
        };
        let name = name.trim();
        let Some(spec) = strategy.parameter(name) else {
            return Err(TrendQuestError::invalid_request(format!(
                "strategy {} has no parameter '{}', expected one of: {}",
                strategy.code,
                name,
                strategy.parameter_names().collect::<Vec<_>>().join(", ")
            )));
        };
        input = input.with(&format!("param.{}", spec.name), value.trim());
    }
    Ok(input)
}

fn run_backtest(config_path: Option<&Path>, args: &BacktestArgs) -> ExitCode {
    let ctx = match load_context(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let visualizer = visualizer_for(&ctx.settings);
    let today: NaiveDate = visualizer.reference_date();

    let input = match form_input(&ctx.catalog, args) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let outcome = collect_backtest_form(&ctx.catalog, today, &input);
    for notice in &outcome.notices {
        eprintln!("warning: {notice}");
    }
    let request = match outcome.request {
        Some(r) if outcome.submitted => r,
        _ => {
            eprintln!("error: backtest not submitted, correct the inputs above");
            return ExitCode::from(4);
        }
    };

    let engine = CsvEngineAdapter::new(ctx.settings.results_dir.clone());
    let pipeline = Pipeline {
        catalog: &ctx.catalog,
        engine: &engine,
        visualizer: &visualizer,
        settings: &ctx.settings,
    };
    let report = match pipeline.run(&request, now()) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "backtest failed");
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let output = args.output.display().to_string();
    if let Err(e) = HtmlReportAdapter::new().write(&report, &output) {
        eprintln!("error: failed to write report: {e}");
        return (&e).into();
    }
    if let Some(csv_path) = &args.csv {
        if let Err(e) = write_summary_csv(csv_path, report.results.values()) {
            eprintln!("error: failed to write summary CSV: {e}");
            return (&e).into();
        }
        eprintln!("Summary CSV written to: {}", csv_path.display());
    }

    println!("=== {} ===", report.title);
    for metric in &report.summary {
        println!("{:<12} {}", metric.name, metric.text());
    }
    for result in report.results.values() {
        println!(
            "  {} {}: {} ({} trades, avg win {}, avg loss {})",
            result.symbol,
            result.name,
            percent(result.return_rate),
            result.total_trades,
            decimal(result.avg_win),
            decimal(result.avg_loss)
        );
    }
    eprintln!("\nReport written to: {output}");
    ExitCode::SUCCESS
}

fn run_strategies(config_path: Option<&Path>) -> ExitCode {
    let ctx = match load_context(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    for strategy in ctx.catalog.strategies.list() {
        println!("{} ({})", strategy.display_name, strategy.code);
        if !strategy.description.is_empty() {
            println!("  {}", strategy.description);
        }
        for p in &strategy.parameters {
            let range = match (p.minimum, p.maximum) {
                (Some(min), Some(max)) => format!(" [{min}, {max}]"),
                _ => String::new(),
            };
            println!(
                "  - {} ({}, {}){} default {}",
                p.name,
                p.display_name,
                p.kind.as_str(),
                range,
                p.default.as_deref().unwrap_or("-")
            );
        }
    }
    ExitCode::SUCCESS
}

fn run_pools(config_path: Option<&Path>) -> ExitCode {
    let ctx = match load_context(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    for pool in ctx.catalog.pools.pools() {
        println!("{} ({} symbols)", pool.name, pool.count());
        if !pool.description.is_empty() {
            println!("  {}", pool.description);
        }
        for s in &pool.symbols {
            if s.industry.is_empty() {
                println!("  {} {}", s.code, s.name);
            } else {
                println!("  {} {} [{}]", s.code, s.name, s.industry);
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_serve(config_path: Option<&Path>) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::sync::Arc;

        let ctx = match load_context(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        let listen = ctx.settings.listen.clone();
        let state = AppState {
            visualizer: visualizer_for(&ctx.settings),
            engine: Arc::new(CsvEngineAdapter::new(ctx.settings.results_dir.clone())),
            catalog: ctx.catalog,
            settings: ctx.settings,
        };
        let router = build_router(state);

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("error: failed to start runtime: {e}");
                return ExitCode::from(1);
            }
        };
        let served: std::io::Result<()> = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(&listen).await?;
            tracing::info!(addr = %listen, "web server listening");
            eprintln!("Starting web server on {listen}");
            axum::serve(listener, router).await
        });

        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                let err = TrendQuestError::Io(e);
                tracing::error!(error = %err, addr = %listen, "web server stopped");
                eprintln!("error: {err}");
                (&err).into()
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
