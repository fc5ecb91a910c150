use crate::database::models::FollowRecord;
use crate::database::repositories::{FollowRepository, UserRepository};
use crate::database::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::utils::now_utc_iso;

#[derive(Clone)]
pub struct FollowService {
    database: Database,
}

/// Result of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
}

impl FollowService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Records that `follower_id` follows `target_id`. The edge insert and
    /// both counter increments commit together; repeating the call is a
    /// no-op.
    pub fn follow(&self, target_id: &str, follower_id: &str) -> ServiceResult<FollowOutcome> {
        let outcome = self
            .database
            .with_transaction(|repos| -> ServiceResult<FollowOutcome> {
                let users = repos.users();
                let target = users.get(target_id)?;
                let me = users.get(follower_id)?;
                let (Some(target), Some(me)) = (target, me) else {
                    return Err(ServiceError::not_found("not found"));
                };
                if target.id == me.id {
                    return Err(ServiceError::bad_request("cannot follow self"));
                }

                let inserted = repos.follows().add(&FollowRecord {
                    follower_id: me.id.clone(),
                    followee_id: target.id.clone(),
                    created_at: now_utc_iso(),
                })?;
                if !inserted {
                    return Ok(FollowOutcome::AlreadyFollowing);
                }
                users.increment_followers(&target.id)?;
                users.increment_following(&me.id)?;
                Ok(FollowOutcome::Followed)
            })?;

        tracing::debug!(
            follower_id = %follower_id,
            target_id = %target_id,
            ?outcome,
            "follow processed"
        );
        Ok(outcome)
    }
}
