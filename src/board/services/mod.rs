//! Application services for board lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    BoardLifecycleError, BoardLifecycleResult, BoardLifecycleService, CreateBoardRequest,
    OwnerMembershipHook,
};
