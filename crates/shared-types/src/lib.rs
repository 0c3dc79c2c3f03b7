pub mod error;
pub mod feature_flags;
pub mod todo;
pub mod user;
pub mod view;

pub use error::*;
pub use feature_flags::*;
pub use todo::*;
pub use user::*;
pub use view::*;
