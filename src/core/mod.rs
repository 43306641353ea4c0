mod error;
mod plan;
mod result;

pub use error::QaError;
pub use plan::{PlanEntry, TEST_PLAN};
pub use result::{Analysis, Outcome, ResultRecord, Verdict};
