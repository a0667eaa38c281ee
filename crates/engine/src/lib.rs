pub use bills::Bill;
pub use commands::{BillCmd, UserCmd};
pub use consumers::Consumer;
pub use error::EngineError;
pub use lifecycle::Lifecycle;
pub use locations::Location;
pub use notify::{Notifier, RedisNotifier, UserEvent};
pub use ops::{Engine, EngineBuilder};
pub use receivers::Receiver;
pub use users::User;

mod bill_consumers;
mod bills;
mod commands;
mod consumers;
mod error;
mod exec;
mod lifecycle;
mod locations;
mod notify;
mod ops;
mod receivers;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
