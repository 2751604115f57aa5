pub mod entities;
pub mod field_comparator;
pub mod value_objects;
