//! Presentation module for the txflow lifecycle visualizer.
//!
//! Turns the session's stage and accumulated transaction data into the views
//! a client displays: the stage timeline, the three-tab data panel in
//! beginner or technical wording, the raw JSON dump and the live overlay read
//! straight from the network.

pub mod live;
pub mod panel;
pub mod stages;

pub use live::{LiveData, LiveDataFetcher};
pub use panel::{raw_json, DisplayMode, FieldView, PanelView, Presenter, TabKind, TabView};
pub use stages::{descriptor, stage_progress, timeline, StageDescriptor, StageStep, StepState};
