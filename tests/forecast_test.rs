mod common;

use salesrs::config::ModelConfig;
use salesrs::dataframe::DataFrame;
use salesrs::error::Error;
use salesrs::ml::{ModelType, SalesForecaster};
use salesrs::sales::{self, MovingAverageForecaster, SalesDataProcessor};

use common::{date, generate_orders, write_orders};

fn daily_features(days: usize) -> DataFrame {
    let file = write_orders(&generate_orders(date(2022, 1, 1), days, 5));
    let processor = SalesDataProcessor::new();
    let orders = processor.load_and_preprocess(file.path()).unwrap();
    let ts = processor.create_time_series(&orders, "Order Date", "Sales").unwrap();
    processor.prepare_features(&ts).unwrap()
}

fn small_forest() -> ModelConfig {
    ModelConfig {
        n_estimators: 15,
        max_depth: Some(6),
        ..ModelConfig::default()
    }
}

#[test]
fn test_split_sizes() {
    let features = daily_features(130);
    let forecaster = SalesForecaster::new(ModelType::RandomForest);
    let data = forecaster
        .prepare_data_for_training(&features, "sales", 0.2)
        .unwrap();

    // the first 29 days have no 30-day average and are dropped
    let complete = 130 - 29;
    assert_eq!(data.x_test.n_samples(), (complete as f64 * 0.2).ceil() as usize);
    assert_eq!(data.x_train.n_samples() + data.x_test.n_samples(), complete);
    assert_eq!(data.y_train.len(), data.x_train.n_samples());
    assert!(!data.feature_names().iter().any(|f| f == "sales"));
}

#[test]
fn test_both_models_train_and_evaluate() {
    let features = daily_features(130);
    for model_type in [ModelType::RandomForest, ModelType::LinearRegression] {
        let mut forecaster = SalesForecaster::with_config(ModelConfig {
            model_type,
            ..small_forest()
        });
        let data = forecaster
            .prepare_data_for_training(&features, "sales", 0.2)
            .unwrap();
        forecaster.train(&data.x_train, &data.y_train).unwrap();

        let metrics = forecaster.evaluate(&data.x_test, &data.y_test).unwrap();
        for key in ["mae", "mse", "rmse", "r2"] {
            assert!(metrics.get_metric(key).unwrap().is_finite(), "{} {}", model_type, key);
        }
        let mse = metrics.get_metric("mse").unwrap();
        assert!((metrics.get_metric("rmse").unwrap() - mse.sqrt()).abs() < 1e-9);

        let importance = forecaster.get_feature_importance(data.feature_names()).unwrap();
        assert_eq!(importance.len(), data.feature_names().len());
    }
}

#[test]
fn test_training_is_deterministic() {
    let features = daily_features(100);
    let run = || {
        let mut forecaster = SalesForecaster::with_config(small_forest());
        let data = forecaster
            .prepare_data_for_training(&features, "sales", 0.25)
            .unwrap();
        forecaster.train(&data.x_train, &data.y_train).unwrap();
        forecaster.predict(&data.x_test).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_forest_importance_sums_to_one() {
    let features = daily_features(100);
    let mut forecaster = SalesForecaster::with_config(small_forest());
    let data = forecaster
        .prepare_data_for_training(&features, "sales", 0.2)
        .unwrap();
    forecaster.train(&data.x_train, &data.y_train).unwrap();

    let importance = forecaster.get_feature_importance(data.feature_names()).unwrap();
    let total: f64 = importance.iter().map(|f| f.importance).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(importance.windows(2).all(|w| w[0].importance >= w[1].importance));
}

#[test]
fn test_untrained_forecaster_refuses_work() {
    let features = daily_features(60);
    for model_type in [ModelType::RandomForest, ModelType::LinearRegression] {
        let forecaster = SalesForecaster::new(model_type);
        let data = forecaster
            .prepare_data_for_training(&features, "sales", 0.2)
            .unwrap();
        assert!(matches!(forecaster.predict(&data.x_test), Err(Error::NotTrained(_))));
        assert!(matches!(
            forecaster.evaluate(&data.x_test, &data.y_test),
            Err(Error::NotTrained(_))
        ));
        assert!(matches!(
            forecaster.get_feature_importance(data.feature_names()),
            Err(Error::NotTrained(_))
        ));
    }
}

#[test]
fn test_unknown_model_name() {
    assert!(matches!(
        SalesForecaster::from_name("gradient_boosting"),
        Err(Error::UnsupportedModel(_))
    ));
    assert_eq!(
        SalesForecaster::from_name("linear_regression").unwrap().model_type(),
        ModelType::LinearRegression
    );
}

#[test]
fn test_projections_follow_the_series() {
    let file = write_orders(&generate_orders(date(2022, 1, 1), 40, 2));
    let orders = SalesDataProcessor::new().load_and_preprocess(file.path()).unwrap();
    let ts = sales::create_time_series(&orders, "Order Date", "Sales").unwrap();

    let points = sales::GrowthProjection::default()
        .project(&ts, "date", "sales")
        .unwrap();
    assert_eq!(points.len(), 30);
    assert_eq!(points[0].date, date(2022, 2, 10));
    assert!(points.windows(2).all(|w| w[1].forecast > w[0].forecast));

    let mut naive = MovingAverageForecaster::default();
    naive.fit(&ts, "sales").unwrap();
    let flat = naive.predict(5).unwrap();
    assert_eq!(flat.len(), 5);
    assert!(flat.iter().all(|p| p.forecast == flat[0].forecast));
}
