pub mod ask;
pub mod chat;
pub mod dump;
pub mod ingest;
pub mod search;
pub mod stats;
