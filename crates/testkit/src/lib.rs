mod yaml_runner;

pub use yaml_runner::{
    LoadError, TestCase, TestResult, load_test_cases_from_path, load_test_cases_from_str,
    matches_flavor, run_test, run_test_with_connection,
};
