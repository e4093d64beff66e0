pub mod metrics_tests;
