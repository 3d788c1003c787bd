//! mrportal-core: schedule, status, and session model for the MR Portal console.
//!
//! Everything here is synchronous and free of I/O; `mrportal-api` drives it.

pub mod board;
pub mod map;
pub mod projection;
pub mod report;
pub mod session;
pub mod status;
pub mod subject;
pub mod task;
pub mod time;
pub mod wire;

pub use board::{PendingTransition, TaskBoard, Transition, TransitionError, TRANSITION_FAILED};
pub use map::{RouteMap, Stop};
pub use projection::{project, Buckets, Summary};
pub use report::{ReportError, ReportKind, ReportPeriod, ReportQuery, ReportTable};
pub use session::{Identity, Role, Session, SessionError};
pub use status::{Action, StatusParseError, TaskStatus};
pub use subject::{resolve_subject, MrSummary, Roster, SubjectResolution};
pub use task::Task;
