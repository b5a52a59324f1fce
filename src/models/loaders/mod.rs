pub mod toml_loader;

pub use toml_loader::{load_builtin_bank, load_question_bank, parse_question_bank};
