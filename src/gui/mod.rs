pub mod frontend;
pub mod info_panel;
