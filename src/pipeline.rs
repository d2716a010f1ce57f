//! End-to-end run: load, aggregate, train, evaluate, project and summarize
//!
//! Each stage logs its start and end. The first failing stage stops the run
//! and its error comes back wrapped in [`Error::Stage`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{error, info, warn};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::ml::anomaly_detection;
use crate::ml::forecaster::{ModelType, SalesForecaster, TrainTestData};
use crate::ml::models::FeatureImportance;
use crate::sales::{
    self, ForecastPoint, GrowthProjection, KpiSummary, SalesDataProcessor, CUSTOMER_ID, DATE,
};
use crate::stats::{self, DescriptiveStats};

/// Outcome of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Rows loaded from the input
    pub records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub total_sales: f64,
    /// Days in the aggregated series
    pub days: usize,
    /// Summary of the daily totals
    pub daily_sales: DescriptiveStats,
    pub model_type: ModelType,
    pub metrics: BTreeMap<String, f64>,
    pub feature_importance: Vec<FeatureImportance>,
    pub forecast: Vec<ForecastPoint>,
    pub kpis: KpiSummary,
    /// Customers per tier, empty when the input has no customer ids
    pub customer_tiers: BTreeMap<String, usize>,
    /// Days whose total is an outlier
    pub outlier_days: usize,
}

impl PipelineReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs every stage over the configured input
#[derive(Debug, Clone)]
pub struct SalesPipeline {
    config: PipelineConfig,
    processor: SalesDataProcessor,
}

impl SalesPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        SalesPipeline {
            config,
            processor: SalesDataProcessor::new(),
        }
    }

    /// Replace the loader, e.g. to read another date format
    pub fn with_processor(mut self, processor: SalesDataProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<PipelineReport> {
        info!("starting sales pipeline on {}", self.config.data_path.display());

        let orders = stage("load", || {
            self.processor.load_and_preprocess(&self.config.data_path)
        })?;
        stage("schema", || self.check_schema(&orders))?;
        let series = stage("aggregate", || {
            sales::create_time_series(&orders, &self.config.date_column, &self.config.value_column)
        })?;
        let features = stage("features", || sales::prepare_features(&series))?;

        let mut forecaster = SalesForecaster::with_config(self.config.model.clone());
        let data = stage("split", || {
            forecaster.prepare_data_for_training(
                &features,
                &self.config.target_column,
                self.config.model.test_fraction,
            )
        })?;
        stage("train", || {
            forecaster.train(&data.x_train, &data.y_train).map(|_| ())
        })?;
        let metrics = stage("evaluate", || self.evaluate(&forecaster, &data))?;
        let feature_importance = stage("importance", || {
            forecaster.get_feature_importance(data.feature_names())
        })?;
        let forecast = stage("projection", || {
            let projection = GrowthProjection::new(
                self.config.forecast.window,
                self.config.forecast.horizon,
                self.config.forecast.growth_rate,
            );
            projection.project(&series, DATE, &self.config.target_column)
        })?;
        let (kpis, customer_tiers, outlier_days) =
            stage("insights", || self.insights(&orders, &series))?;

        let dates: Vec<NaiveDate> = series
            .date_values(DATE)?
            .iter()
            .filter_map(|d| d.get())
            .collect();
        let daily_totals: Vec<f64> = series
            .numeric_values(&self.config.target_column)?
            .iter()
            .filter_map(|v| v.get())
            .collect();

        let report = PipelineReport {
            records: orders.row_count(),
            first_date: dates.first().copied(),
            last_date: dates.last().copied(),
            total_sales: kpis.total_sales,
            days: series.row_count(),
            daily_sales: stats::describe(&daily_totals)?,
            model_type: forecaster.model_type(),
            metrics,
            feature_importance,
            forecast,
            kpis,
            customer_tiers,
            outlier_days,
        };
        info!(
            "pipeline finished: {} records, {} days, {} forecast points",
            report.records,
            report.days,
            report.forecast.len()
        );
        Ok(report)
    }

    fn check_schema(&self, orders: &DataFrame) -> Result<()> {
        orders.require_columns(&[
            self.config.date_column.as_str(),
            self.config.value_column.as_str(),
        ])?;
        let missing = self.processor.missing_required_columns(orders);
        if missing.is_empty() {
            return Ok(());
        }
        if self.config.strict_schema {
            return Err(Error::MissingColumns(missing));
        }
        warn!("continuing without columns: {}", missing.join(", "));
        Ok(())
    }

    fn evaluate(&self, forecaster: &SalesForecaster, data: &TrainTestData) -> Result<BTreeMap<String, f64>> {
        let metrics = forecaster.evaluate(&data.x_test, &data.y_test)?;
        for (name, value) in metrics.metrics() {
            info!("{} = {:.4}", name, value);
        }
        Ok(metrics.metrics().clone())
    }

    fn insights(
        &self,
        orders: &DataFrame,
        series: &DataFrame,
    ) -> Result<(KpiSummary, BTreeMap<String, usize>, usize)> {
        let kpis = KpiSummary::compute(orders)?;

        let tiers = if orders.contains_column(CUSTOMER_ID) {
            let segments = sales::segment_customers(orders, &self.config.value_column)?;
            sales::tier_counts(&segments)
        } else {
            warn!("no '{}' column, skipping customer tiers", CUSTOMER_ID);
            BTreeMap::new()
        };

        let outliers = anomaly_detection::detect_outliers(
            series,
            &self.config.target_column,
            self.config.outlier_threshold,
        )?;
        Ok((kpis, tiers, outliers.row_count()))
    }
}

/// Run one stage with start/end logging, tagging a failure with the stage name
fn stage<T, F>(name: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    info!("stage '{}' started", name);
    match f() {
        Ok(value) => {
            info!("stage '{}' finished", name);
            Ok(value)
        }
        Err(err) => {
            error!("stage '{}' failed: {}", name, err);
            Err(Error::in_stage(name, err))
        }
    }
}
