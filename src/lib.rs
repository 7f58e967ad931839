pub mod backend;
pub mod config;
pub mod console;
pub mod document;
pub mod error;
pub mod events;
pub mod filter;
pub mod focus;
pub mod input;
pub mod item;
pub mod lightbox;
pub mod navigation;
pub mod render;
pub mod scene;
pub mod upload;
pub mod viewer;
pub mod tasks {
    pub mod preloader;
    pub mod session;
}

pub use error::Error;
