pub mod task_names;
pub mod yaml;
