mod table_builder;

pub use table_builder::TableBuilder;
