pub mod graph_utils;
pub mod gui;
pub mod interaction;
pub mod loader;
pub mod persistence;
pub mod scene;
pub mod viewer;
