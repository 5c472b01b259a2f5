//! Client core for the hirrd job board: async resource controllers, the backend
//! seam with its REST implementation, form validation and page view models.

pub mod backend;
pub mod error;
pub mod forms;
pub mod resource;
pub mod rest;
pub mod views;

pub use backend::{JobBoardBackend, MissingBackend};
pub use error::{ErrorCategory, OperationError};
pub use resource::{AsyncResource, AsyncState, CommitPolicy, Phase, Trigger};
pub use rest::{RestBackend, RestConfig};
pub use views::{Backend, Viewer};
