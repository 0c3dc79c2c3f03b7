pub mod todo;

pub use todo::TodoService;
