#![forbid(unsafe_code)]

mod auth;
mod config;
mod context;
mod error;
mod executor;
mod orchestrator;
mod registry;
mod report;
mod signal;
mod vu;

pub use auth::{RoleLogin, login};
pub use config::{LoadConfig, RunWindow, ThinkTime};
pub use context::RunContext;
pub use error::{Error, Result};
pub use executor::{RequestExecutor, RequestResult, RequestStatus};
pub use orchestrator::{ScenarioBaseline, health_check, run_baseline, run_load_test};
pub use registry::{AuthRole, HttpMethod, Scenario, ScenarioRegistry};
pub use report::{LoadTestReport, ScenarioStats, aggregate};
pub use signal::CancelSignal;
pub use vu::{VuContext, run_vu};
