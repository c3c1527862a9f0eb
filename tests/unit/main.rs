mod cache_test;
mod debounce_test;
mod dedup_test;
mod query_test;
mod storage_test;
