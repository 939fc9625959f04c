use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    sms::SmsSender,
    verification::VerificationStore,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub verifications: Arc<dyn VerificationStore>,
    pub sms: Arc<dyn SmsSender>,
}
