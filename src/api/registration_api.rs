// ==========================================
// 考务监考排班系统 - 自助报名 API
// ==========================================
// 门控: lecturer 及以上；只能为调用方本人的监考员档案报名 / 取消
// ==========================================

use std::sync::Arc;

use crate::api::auth::{require_examiner, require_role, ActorRole, CallerIdentity};
use crate::api::error::ApiResult;
use crate::api::validator::require_id;
use crate::engine::{RegistrationOutcome, RegistrationWorkflow};

pub struct RegistrationApi {
    workflow: Arc<RegistrationWorkflow>,
}

impl RegistrationApi {
    pub fn new(workflow: Arc<RegistrationWorkflow>) -> Self {
        Self { workflow }
    }

    pub fn register(&self, caller: &CallerIdentity, room_id: i64) -> ApiResult<RegistrationOutcome> {
        require_role(caller, ActorRole::Lecturer)?;
        let examiner_id = require_examiner(caller)?;
        require_id("room_id", room_id)?;
        Ok(self.workflow.register(examiner_id, room_id)?)
    }

    pub fn unregister(&self, caller: &CallerIdentity, room_id: i64) -> ApiResult<RegistrationOutcome> {
        require_role(caller, ActorRole::Lecturer)?;
        let examiner_id = require_examiner(caller)?;
        require_id("room_id", room_id)?;
        Ok(self.workflow.unregister(examiner_id, room_id)?)
    }
}
