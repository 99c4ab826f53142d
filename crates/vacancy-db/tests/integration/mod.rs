mod common;
mod database_tests;
mod ingest_tests;
mod store_tests;
