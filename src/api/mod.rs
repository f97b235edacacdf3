// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod auth_guard {
    pub use crate::auth_guard::*;
}
