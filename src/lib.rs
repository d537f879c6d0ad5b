pub mod editor;
pub mod logging;
pub mod render;
pub mod theme;
