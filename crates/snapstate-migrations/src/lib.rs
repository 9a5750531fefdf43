pub mod error;
pub mod registry;
pub mod runner;
pub mod stamp;
pub mod steps;
pub mod walker;

pub use error::{MigrationError, MigrationFailure, ShapeError};
pub use registry::{MigrationRegistry, MigrationStep, Transform};
pub use runner::{MigrationOutcome, run};
pub use stamp::{read_version, stamp};
pub use walker::{for_each_tab, for_each_workspace};
