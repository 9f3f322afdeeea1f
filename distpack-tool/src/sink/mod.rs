pub mod save_file;

pub use save_file::{CountingWriter, FileSink, create_file_writer};
