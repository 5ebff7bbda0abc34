mod convergence_tests;
mod scanner_tests;
mod support;
