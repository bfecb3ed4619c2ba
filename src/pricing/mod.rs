pub mod calculator;
pub mod discount;
pub mod models;
pub mod production;
pub mod report;
pub mod repository;
pub mod service;
pub mod sqlite;

pub use discount::{DiscountSchedule, DiscountTier};
pub use models::{
    CostEstimate, EstimateRequest, EstimateResponse, MaterialGrade, MaterialRate, MaterialType,
    Panel, ProcessRate, Supplier,
};
pub use repository::{EstimateSink, RateHistoryQuery, ReferenceDataStore};
pub use service::EstimateService;
pub use sqlite::SqliteStore;
