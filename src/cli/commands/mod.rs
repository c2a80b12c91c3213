pub mod load;
pub mod settings;
