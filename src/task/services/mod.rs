//! Application services for the task mutation pipeline.

mod allocator;
mod config;
mod coordinator;
mod recorder;
mod statistics;

pub use allocator::{AllocationError, LanePositionAllocator};
pub use config::TaskValidationConfig;
pub use coordinator::{
    CreateTaskRequest, DeleteTaskRequest, ErrorKind, ReorderTaskRequest, TaskMutationError,
    TaskMutationResult, TaskMutationService, UpdateTaskRequest,
};
pub use recorder::ChangeRecorder;
pub use statistics::BoardStatisticsService;
