use async_trait::async_trait;

use crate::application::errors::MembershipError;
use crate::domain::entities::RequiredGroup;

/// Reports whether a user currently belongs to a group
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    async fn check_membership(&self, user_id: &str, group: &RequiredGroup) -> Result<bool, MembershipError>;
}
