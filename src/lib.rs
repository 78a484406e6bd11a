pub mod config;
pub mod error;
pub mod geodesy;
pub mod gnss;
pub mod magnetic;
pub mod navigation;
pub mod session;
pub mod target_store;

pub use config::Config;
pub use error::{ConfigError, NavigationError, PersistenceError};
pub use gnss::{Coordinate, OrientationSample, PositionSample};
pub use navigation::{Command, NavigationState, NavigationStateMachine, UserAction};
pub use session::{Event, Indicator, MarkerCommand, NavigationSession, Outputs, Renderer};
pub use target_store::{MemoryTargetStore, TargetStore, TomlTargetStore};
