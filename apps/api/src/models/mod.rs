pub mod context;
pub mod document;
pub mod report;
