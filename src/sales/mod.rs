//! Sales domain: loading order exports, daily aggregation, features,
//! customer tiers, projections and KPIs

pub mod features;
pub mod kpi;
pub mod loader;
pub mod projection;
pub mod segmentation;
pub mod time_series;

pub use features::prepare_features;
pub use kpi::{sales_breakdown, top_n, KpiSummary, SalesFilter};
pub use loader::SalesDataProcessor;
pub use projection::{forecast_frame, ForecastPoint, GrowthProjection, MovingAverageForecaster};
pub use segmentation::{segment_customers, segments_frame, tier_counts, CustomerSegment, CustomerTier};
pub use time_series::create_time_series;

// Columns of the order export
pub const ORDER_DATE: &str = "Order Date";
pub const SHIP_DATE: &str = "Ship Date";
pub const SALES: &str = "Sales";
pub const CATEGORY: &str = "Category";
pub const SEGMENT: &str = "Segment";
pub const REGION: &str = "Region";
pub const STATE: &str = "State";
pub const PRODUCT_NAME: &str = "Product Name";
pub const CUSTOMER_ID: &str = "Customer ID";
pub const ORDER_ID: &str = "Order ID";
pub const QUANTITY: &str = "Quantity";
pub const DISCOUNT: &str = "Discount";

/// Columns every order export is expected to carry
pub const REQUIRED_COLUMNS: [&str; 12] = [
    ORDER_DATE,
    SHIP_DATE,
    SALES,
    CATEGORY,
    SEGMENT,
    REGION,
    STATE,
    PRODUCT_NAME,
    CUSTOMER_ID,
    ORDER_ID,
    QUANTITY,
    DISCOUNT,
];

// Derived columns
pub const DATE: &str = "date";
pub const PROFIT: &str = "Profit";
pub const SALES_PER_ORDER: &str = "Sales_per_order";
pub const PROCESSING_TIME: &str = "Order Processing Time";
pub const CUSTOMER_ORDER_COUNT: &str = "Customer Order Count";
pub const CUSTOMER_TOTAL_SALES: &str = "Customer Total Sales";

// Daily series
pub const DAILY_SALES: &str = "sales";
pub const MA_7: &str = "7_day_MA";
pub const MA_30: &str = "30_day_MA";
