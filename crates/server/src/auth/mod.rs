pub mod extractors;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use extractors::AuthUser;
pub use jwt::{Claims, JwtKeys};
