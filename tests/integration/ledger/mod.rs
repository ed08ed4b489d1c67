mod concurrency;
mod scenario;
mod store_format;
