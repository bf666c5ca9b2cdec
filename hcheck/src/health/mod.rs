pub mod aggregator;
pub mod checks;
pub mod registry;
pub mod report;
pub mod runner;
pub mod status;
pub mod test_func;

pub use aggregator::{Aggregator, Completion, Evaluation};
pub use checks::{default_check, FilesystemCheck};
pub use registry::{Registry, DEFAULT_TEST};
pub use report::{HealthCheck, TestResult};
pub use status::Status;
pub use test_func::{CancelGuard, CheckContext, TestFunc, TestOutcome};
