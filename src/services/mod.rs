pub mod memos_client;

pub use memos_client::{ListQuery, MemoPatch, MemosApi, MemosClient};
