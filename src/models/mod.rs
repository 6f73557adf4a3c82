pub mod domain;

pub use domain::{CreatedNote, Note, Visibility};
