mod common;

use salesrs::config::PipelineConfig;
use salesrs::error::Error;
use salesrs::ml::ModelType;
use salesrs::pipeline::SalesPipeline;

use common::{date, generate_orders, with_integer_ids, write_config, write_csv, write_orders};

#[test]
fn test_pipeline_from_toml_config() {
    let data = write_orders(&generate_orders(date(2021, 1, 1), 120, 4));
    let body = format!(
        "data_path = {:?}\n\n[model]\nn_estimators = 10\nmax_depth = 5\n\n[forecast]\nhorizon = 14\n",
        data.path().display().to_string()
    );
    let config_file = write_config(".toml", &body);

    let config = PipelineConfig::from_file(config_file.path()).unwrap();
    assert_eq!(config.model.model_type, ModelType::RandomForest);
    let report = SalesPipeline::new(config).run().unwrap();

    assert_eq!(report.records, 480);
    assert_eq!(report.days, 120);
    assert_eq!(report.first_date, Some(date(2021, 1, 1)));
    assert_eq!(report.last_date, Some(date(2021, 4, 30)));
    assert_eq!(report.forecast.len(), 14);
    assert_eq!(report.forecast[0].date, date(2021, 5, 1));
    assert_eq!(report.daily_sales.count, 120);
    assert_eq!(report.customer_tiers.values().sum::<usize>(), 25);

    let total_importance: f64 = report.feature_importance.iter().map(|f| f.importance).sum();
    assert!((total_importance - 1.0).abs() < 1e-9);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["model_type"], "random_forest");
    for key in ["mae", "mse", "rmse", "r2"] {
        assert!(json["metrics"][key].is_number());
    }
    assert_eq!(json["forecast"][0]["date"], "2021-05-01");
}

#[test]
fn test_pipeline_is_reproducible() {
    let data = write_orders(&generate_orders(date(2021, 1, 1), 80, 3));
    let mut config = PipelineConfig::default();
    config.data_path = data.path().to_path_buf();
    config.model.n_estimators = 8;

    let first = SalesPipeline::new(config.clone()).run().unwrap();
    let second = SalesPipeline::new(config).run().unwrap();
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.forecast, second.forecast);
}

#[test]
fn test_parallel_forest_matches_sequential() {
    let data = write_orders(&generate_orders(date(2021, 1, 1), 80, 3));
    let mut config = PipelineConfig::default();
    config.data_path = data.path().to_path_buf();
    config.model.n_estimators = 8;

    let sequential = SalesPipeline::new(config.clone()).run().unwrap();
    config.model.n_jobs = 2;
    let parallel = SalesPipeline::new(config).run().unwrap();
    assert_eq!(sequential.metrics, parallel.metrics);
}

#[test]
fn test_integer_ids_with_gaps_reach_insights() {
    let rows = with_integer_ids(&generate_orders(date(2021, 1, 1), 60, 2), 10, 3);
    let data = write_orders(&rows);
    let mut config = PipelineConfig::default();
    config.data_path = data.path().to_path_buf();
    config.model.n_estimators = 5;

    let report = SalesPipeline::new(config).run().unwrap();
    assert_eq!(report.records, 120);
    // 25 customers plus the placeholder for the blank id
    assert_eq!(report.customer_tiers.values().sum::<usize>(), 26);
    assert_eq!(report.kpis.unique_customers, 26);
}

#[test]
fn test_missing_value_column_fails_schema_stage() {
    let data = write_csv("Order Date,Amount", &["01/01/2021,5".to_string()]);
    let mut config = PipelineConfig::default();
    config.data_path = data.path().to_path_buf();

    match SalesPipeline::new(config).run() {
        Err(Error::Stage { stage, source }) => {
            assert_eq!(stage, "schema");
            assert!(matches!(*source, Error::MissingColumns(ref m) if m == &vec!["Sales".to_string()]));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("pipeline should fail"),
    }
}

#[test]
fn test_too_little_history_fails_split_stage() {
    // ten days leave no row with a 30-day average
    let data = write_orders(&generate_orders(date(2021, 1, 1), 10, 2));
    let mut config = PipelineConfig::default();
    config.data_path = data.path().to_path_buf();

    assert!(matches!(
        SalesPipeline::new(config).run(),
        Err(Error::Stage { stage: "split", .. })
    ));
}

#[test]
fn test_yaml_config_with_linear_model() {
    let data = write_orders(&generate_orders(date(2021, 1, 1), 70, 3));
    let body = format!(
        "data_path: {:?}\nmodel:\n  model_type: linear_regression\noutlier_threshold: 2.5\n",
        data.path().display().to_string()
    );
    let config_file = write_config(".yml", &body);
    let config = PipelineConfig::from_file(config_file.path()).unwrap();
    assert_eq!(config.outlier_threshold, 2.5);

    let report = SalesPipeline::new(config).run().unwrap();
    assert_eq!(report.model_type, ModelType::LinearRegression);
    assert_eq!(report.forecast.len(), 30);
}

#[test]
fn test_invalid_config_is_rejected() {
    let file = write_config(".json", r#"{"model": {"n_estimators": 0}}"#);
    assert!(matches!(
        PipelineConfig::from_file(file.path()),
        Err(Error::Config(_))
    ));
}
