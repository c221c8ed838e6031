use crate::common::*;

use crate::model::configs::write_pressure_config::*;

#[async_trait]
pub trait WritePressureService {
    async fn check_for_write_pressure(&self, params: WritePressureParams) -> Result<()>;
}
