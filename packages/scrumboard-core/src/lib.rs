pub mod board;
pub mod columns;
pub mod dnd;
pub mod editing;
pub mod error;
pub mod events;
pub mod service;
pub mod stats;
pub mod storage;
pub mod story_store;
pub mod tracker;
pub mod types;
