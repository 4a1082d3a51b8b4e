pub mod convert;
pub mod error;
pub mod expressions;
pub mod spec;
pub mod workflow;
