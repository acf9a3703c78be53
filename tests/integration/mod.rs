mod basic_integration;
mod concurrency;
