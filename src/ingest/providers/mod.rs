// src/ingest/providers/mod.rs
pub mod rss2json;
