mod common;

mod schema_tests;
