pub mod config;
pub mod easing;
pub mod error;
pub mod fit;
pub mod scheduler;
pub mod session;
pub mod shading;
pub mod render {
    pub mod loader;
    pub mod viewer;
}

pub use error::Error;
