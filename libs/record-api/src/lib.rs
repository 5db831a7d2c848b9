pub mod config;
pub mod error;
pub mod lifecycle;
pub mod record;
pub mod value;

pub use error::BehaviorError;
pub use lifecycle::{Behavior, Hook, Lifecycle, LifecycleEvent};
pub use record::{MapRecord, Record};
pub use value::{Map, Object, Value};
