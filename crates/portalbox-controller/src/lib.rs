//! Equipment access state machine for the PortalBox.
//!
//! The controller decides, once per control tick, whether the equipment
//! should be powered and what the user should see and hear. It does no I/O:
//! [`transition`] consumes an [`InputSnapshot`] and returns the
//! [`SideEffect`]s for the service to execute.
//!
//! ```text
//! reader/backend/button ──InputSnapshot──► transition ──► [SideEffect] ──► relay, light, sound, backend, email
//!                                            ▲      │
//!                                            └──────┘ AccessState + SessionContext
//! ```

pub mod config;
pub mod effects;
pub mod input;
pub mod machine;
pub mod reclassify;
pub mod session;
pub mod state;

pub use config::{BeepPattern, ControllerConfig, DisplayColors};
pub use effects::{NotificationMode, SideEffect};
pub use input::InputSnapshot;
pub use machine::{AccessStateMachine, AccessStateMachineBuilder, StateTransition, Step, force, transition};
pub use reclassify::{Reclassification, reclassify};
pub use session::SessionContext;
pub use state::AccessState;
