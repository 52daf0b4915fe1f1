mod get;
mod post;

pub use get::{get_run_by_id_handler, get_runs_handler};
pub use post::post_run_handler;

use actix_web::{HttpResponse, Responder, get, post, web};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::{ErrorResponse, ErrorResponseWithMessage};
use crate::config::ProblemRecord;
use crate::history::{RunLog, RunQueryFilter};
use crate::queue::{RunMessage, RunQueue};
use crate::sandbox::{RunRequest, RunResult};

/// Body of `POST /runs`. Sources may be supplied inline or resolved from a
/// catalog problem: the hidden suite via `problem_id`, the editor's current
/// code as `user_source` (falling back to the problem's starter), or the
/// problem's reference solution when `use_reference` is set.
#[derive(Serialize, Deserialize, Debug)]
pub struct RunSubmission {
    pub problem_id: Option<u32>,
    pub user_source: Option<String>,
    pub test_source: Option<String>,
    #[serde(default)]
    pub use_reference: bool,
    pub target_group: Option<String>,
    pub target_case: Option<String>,
}
