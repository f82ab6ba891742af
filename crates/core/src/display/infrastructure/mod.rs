pub mod headless_sink;
pub mod highgui_window;
