//! Database repositories
//!
//! Provides data access layer for database operations.

pub mod health_records;
pub mod library_meals;

pub use health_records::{HealthRecordRepository, HealthRecordRow};
pub use library_meals::{ImageCounts, LibraryMealRepository, LibraryMealRow, MealFilter};
