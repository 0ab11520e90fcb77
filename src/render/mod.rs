mod formatter;

pub use formatter::PromptFormatter;
