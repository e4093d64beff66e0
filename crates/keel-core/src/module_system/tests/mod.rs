pub mod catalog_tests;
pub mod tier_tests;
