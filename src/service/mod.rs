pub mod todo;

pub use todo::{SaveTask, TodoService};
