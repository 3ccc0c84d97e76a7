pub mod prelude;

pub mod read_progress;
