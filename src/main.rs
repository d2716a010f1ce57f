use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use salesrs::config::PipelineConfig;
use salesrs::ml::{anomaly_detection, ModelType};
use salesrs::pipeline::{PipelineReport, SalesPipeline};
use salesrs::sales::{
    self, KpiSummary, SalesDataProcessor, SalesFilter, CATEGORY, PRODUCT_NAME, REGION, SALES,
    SEGMENT, STATE,
};

#[derive(Parser)]
#[command(name = "salesrs")]
#[command(version, about = "Sales forecasting and business insights from order exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: load, aggregate, train, evaluate and project
    Run {
        /// Config file (.toml, .yaml or .json); defaults to salesrs.toml if present
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Input CSV file, overrides the config
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// random_forest or linear_regression, overrides the config
        #[arg(short, long)]
        model: Option<ModelType>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Headline KPIs and sales breakdowns, optionally filtered
    Kpis {
        /// Input CSV file
        #[arg(short, long, env = "SALESRS_DATA")]
        data: PathBuf,
        /// First order date kept (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last order date kept (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        segment: Option<String>,
        #[arg(long)]
        region: Option<String>,
        /// Entries shown per breakdown
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Customer tiers by total sales and order count
    Segments {
        /// Input CSV file
        #[arg(short, long, env = "SALESRS_DATA")]
        data: PathBuf,
        #[arg(long, default_value = SALES)]
        sales_column: String,
    },
    /// Rows whose value is a z-score outlier
    Outliers {
        /// Input CSV file
        #[arg(short, long, env = "SALESRS_DATA")]
        data: PathBuf,
        #[arg(long, default_value = SALES)]
        column: String,
        #[arg(long, default_value_t = anomaly_detection::DEFAULT_Z_THRESHOLD)]
        threshold: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            config,
            data,
            model,
            json,
        } => run_pipeline(config, data, model, json)?,
        Commands::Kpis {
            data,
            start,
            end,
            category,
            segment,
            region,
            top,
        } => {
            let filter = SalesFilter {
                start,
                end,
                category,
                segment,
                region,
            };
            run_kpis(&data, &filter, top)?
        }
        Commands::Segments { data, sales_column } => run_segments(&data, &sales_column)?,
        Commands::Outliers {
            data,
            column,
            threshold,
        } => run_outliers(&data, &column, threshold)?,
    }

    Ok(())
}

fn run_pipeline(
    config_path: Option<PathBuf>,
    data: Option<PathBuf>,
    model: Option<ModelType>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::discover()?,
    };
    if let Some(data) = data {
        config.data_path = data;
    }
    if let Some(model) = model {
        config.model.model_type = model;
    }

    let report = SalesPipeline::new(config).run()?;
    if json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &PipelineReport) {
    println!("Records:      {}", report.records);
    if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
        println!("Date range:   {} to {} ({} days)", first, last, report.days);
    }
    println!("Total sales:  {:.2}", report.total_sales);
    println!(
        "Daily sales:  mean {:.2}, std {:.2}, min {:.2}, max {:.2}",
        report.daily_sales.mean, report.daily_sales.std, report.daily_sales.min, report.daily_sales.max
    );

    println!("\nModel: {}", report.model_type);
    for (name, value) in &report.metrics {
        println!("  {:<5} {:.4}", name, value);
    }

    println!("\nTop features:");
    for item in report.feature_importance.iter().take(10) {
        println!("  {:<16} {:.4}", item.feature, item.importance);
    }

    println!("\nForecast:");
    for point in &report.forecast {
        println!("  {}  {:.2}", point.date, point.forecast);
    }

    print_kpis(&report.kpis);
    if !report.customer_tiers.is_empty() {
        println!("\nCustomer tiers:");
        for (tier, count) in &report.customer_tiers {
            println!("  {:<12} {}", tier, count);
        }
    }
    println!("\nOutlier days: {}", report.outlier_days);
}

fn print_kpis(kpis: &KpiSummary) {
    println!("\nKPIs:");
    println!("  Total sales:      {:.2}", kpis.total_sales);
    println!("  Total profit:     {:.2}", kpis.total_profit);
    println!("  Orders:           {}", kpis.total_orders);
    println!("  Avg order value:  {:.2}", kpis.avg_order_value);
    println!("  Customers:        {}", kpis.unique_customers);
    match kpis.avg_processing_time {
        Some(days) => println!("  Avg processing:   {:.1} days", days),
        None => println!("  Avg processing:   n/a"),
    }
}

fn run_kpis(data: &Path, filter: &SalesFilter, top: usize) -> anyhow::Result<()> {
    let orders = SalesDataProcessor::new().load_and_preprocess(data)?;
    let filtered = filter.apply(&orders)?;
    println!("{} of {} rows selected", filtered.row_count(), orders.row_count());
    print_kpis(&KpiSummary::compute(&filtered)?);

    for (title, dimension) in [
        ("Sales by category", CATEGORY),
        ("Sales by segment", SEGMENT),
        ("Sales by region", REGION),
        ("Sales by state", STATE),
        ("Top products", PRODUCT_NAME),
    ] {
        if !filtered.contains_column(dimension) {
            continue;
        }
        println!("\n{}:", title);
        let breakdown = sales::sales_breakdown(&filtered, dimension, SALES)?;
        for (label, total) in sales::top_n(breakdown, top) {
            println!("  {:<40} {:.2}", label, total);
        }
    }
    Ok(())
}

fn run_segments(data: &Path, sales_column: &str) -> anyhow::Result<()> {
    let processor = SalesDataProcessor::new();
    let orders = processor.load_and_preprocess(data)?;
    let segments = processor.segment_customers(&orders, sales_column)?;
    println!("{}", sales::segments_frame(&segments)?);
    for (tier, count) in sales::tier_counts(&segments) {
        println!("{:<12} {}", tier, count);
    }
    Ok(())
}

fn run_outliers(data: &Path, column: &str, threshold: f64) -> anyhow::Result<()> {
    let processor = SalesDataProcessor::new();
    let orders = processor.load_and_preprocess(data)?;
    let outliers = processor.detect_outliers(&orders, column, threshold)?;
    println!(
        "{} of {} rows have |z| > {} on '{}'",
        outliers.row_count(),
        orders.row_count(),
        threshold,
        column
    );
    if !outliers.is_empty() {
        println!("{}", outliers);
    }
    Ok(())
}
