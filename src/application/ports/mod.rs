pub mod persistence;
pub mod remote;

pub use persistence::{StoreCount, SyncPersistence};
pub use remote::{PushOutcome, RemoteChange, RemoteDataService};
