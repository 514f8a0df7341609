pub mod collector;
pub mod event;
pub mod financial_year;
pub mod task;
