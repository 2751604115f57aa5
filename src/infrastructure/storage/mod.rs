mod rows;
mod sqlite;

pub use sqlite::SqlitePersistence;
