//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories, the plan cache, and the shared planning core.

pub mod meal_import;
pub mod meal_library;
pub mod meal_plan;
pub mod whoop;

pub use meal_import::MealImportService;
pub use meal_library::MealLibraryService;
pub use meal_plan::MealPlanService;
pub use whoop::WhoopService;
