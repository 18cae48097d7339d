pub mod cache;
pub mod cursor;
pub mod custom_repo;
pub mod dto;
pub mod error;
pub mod normalize;
pub mod off_memory;
pub mod off_repo;
pub mod repo;
pub mod repo_types;
pub mod search;
pub mod services;

pub use dto::{CreateFoodRequest, FoodRecord, FoodSource, Nutrients, SearchPage};
pub use error::{FoodError, FoodResult};
pub use search::SearchMode;
pub use services::{CatalogResolver, SearchLimits};
