//! Hosted backend integrations.

pub mod backend {
    pub use crate::backend::*;
}

pub mod supabase_client {
    pub use crate::supabase_client::*;
}

pub mod memory_backend {
    pub use crate::memory_backend::*;
}
