//! Monitor Stream
//!
//! Parses the node's monitor console into dashboard events.
//!
//! - **frame**: delimiter constants, escape stripping and frame cleanup
//! - **logline**: the `HH:MM:SS<R|T> FROM>TO Port=n message` grammar
//! - **events**: the event model published to dashboards
//! - **engine**: the per-session state machine
//! - **archive**: optional raw frame archive
//! - **color**: route display colours
//!
//! # Data Flow
//!
//! ```text
//! bytes ─▶ 0xFE frames ─▶ clean_frame ─┬─▶ telemetry decoder ─▶ TelemetryEvent ─┐
//!                                      └─▶ log grammar ───────▶ Log/RawEvent ───┴─▶ BroadcastHub
//! ```

mod archive;
mod color;
mod engine;
mod error;
mod events;
mod frame;
mod logline;

pub use archive::MonitorArchive;
pub use color::{HslRouteColor, RouteColor};
pub use engine::{MonitorEngine, MonitorState};
pub use error::MonitorError;
pub use events::{FrameEvents, LogEvent, MonitorEvent, RawEvent, TelemetryEvent};
pub use frame::{clean_frame, strip_escape, BANNER, FRAME_TERMINATOR};
pub use logline::{parse_log_line, Direction, LogLine};
