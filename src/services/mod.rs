//! Cross-store services for the supply-chain server

mod analytics;

pub use analytics::{
    AnalyticsService, CustomerSummary, InventoryLine, InventoryReport, MonthlySales,
    ProductPerformance, StatusCount, VendorAnalytics, ANALYTICS_MONTHS,
};
