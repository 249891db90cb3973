// tests/property/main.rs

mod line_splitter;
mod log_buffer;
mod retention;
mod state_machine;
