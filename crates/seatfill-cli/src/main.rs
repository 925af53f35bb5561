use std::path::PathBuf;
use std::process;
use std::time::Duration;

use chrono::{Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use seatfill::config::ResolverConfig;
use seatfill::types::{AttendanceRecord, Period};
use seatfill::{DataQuality, Resolver};

#[derive(Parser)]
#[command(name = "seatfill")]
#[command(about = "Weekly Broadway attendance from live grosses, bundled history and estimates", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        value_name = "PATH",
        global = true,
        help = "Historical weekly CSV dataset [default: historical_weekly_data.csv]"
    )]
    dataset: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Timeout in seconds for each outbound request",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Attendance for the week currently published on the grosses page
    Current {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Attendance for a past week, from the dataset, the by-week page or an estimate
    Historical {
        #[arg(long, help = "Year of the week [default: current year]")]
        year: Option<i32>,

        #[arg(
            long,
            help = "Week number within the year [default: current week]",
            value_parser = clap::value_parser!(u32).range(1..=53)
        )]
        week: Option<u32>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn print_record(record: &AttendanceRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => serialize_json(record),
        OutputFormat::Text => println!("{}", record),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let mut config = ResolverConfig::default();
    if let Some(path) = cli.dataset {
        config = config.with_dataset_path(path);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_fetch_timeout(Duration::from_secs(secs));
    }

    let resolver = Resolver::live(config).unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Current { format } => {
            let record = resolver.current_week(today).await;
            print_record(&record, format);
        }

        Commands::Historical { year, week, format } => {
            let default = Period::containing(today);
            let period = Period::new(year.unwrap_or(today.year()), week.unwrap_or(default.week))
                .unwrap_or_else(|e| {
                    log::error!("Invalid args: {e}");
                    process::exit(1);
                });

            let record = resolver.historical_week(period).await;
            if record.data_quality != DataQuality::Real {
                log::info!(
                    "No concrete figures for {}, serving {} data",
                    period,
                    record.data_quality
                );
            }
            print_record(&record, format);
        }
    }
}
