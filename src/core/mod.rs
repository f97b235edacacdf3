// Domain-layer modules and shared errors/models
pub mod quote_form {
    pub use crate::quote_form::*;
}

pub mod dashboard {
    pub use crate::dashboard::*;
}

pub mod catalog {
    pub use crate::catalog::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
