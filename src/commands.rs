use std::future::Future;

use tracing::{debug, warn};

use crate::api::{ApiResponse, RemoteApi};
use crate::normalize::OptimizationMode;
use crate::session::Session;
use crate::types::PROFILE_HOURS;
use crate::Result;

// -- Command methods --
//
// A command succeeds only on HTTP 200. Success is followed by one refresh so
// the snapshot picks up the new remote state; the refresh may be skipped by
// the scan interval and never changes the command's result.
impl<A: RemoteApi> Session<A> {
    /// Switch the heater on.
    pub async fn turn_on(&self, device_id: &str, full_utilization: bool) -> Result<bool> {
        let call = self.api.set_power(device_id, true, full_utilization);
        self.dispatch("turn_on", device_id, call).await
    }

    /// Switch the heater off.
    pub async fn turn_off(&self, device_id: &str, full_utilization: bool) -> Result<bool> {
        let call = self.api.set_power(device_id, false, full_utilization);
        self.dispatch("turn_off", device_id, call).await
    }

    /// Set the minimum reserve of 40 °C mixed water, in litres.
    pub async fn set_v40_min(&self, device_id: &str, value: f64) -> Result<bool> {
        if !value.is_finite() {
            warn!(device_id, value, "refusing non-finite v40 minimum");
            return Ok(false);
        }
        let call = self.api.set_v40_min(device_id, value);
        self.dispatch("set_v40_min", device_id, call).await
    }

    pub async fn set_optimization_mode(
        &self,
        device_id: &str,
        option: &OptimizationMode,
        sub_option: Option<&str>,
    ) -> Result<bool> {
        let call = self
            .api
            .set_optimization_mode(device_id, option.as_str(), sub_option.unwrap_or(""));
        self.dispatch("set_optimization_mode", device_id, call).await
    }

    /// Replace the 24-hour temperature profile (index 0 is 00:00 UTC).
    pub async fn set_profile(&self, device_id: &str, hours: &[f64; PROFILE_HOURS]) -> Result<bool> {
        let call = self.api.set_profile(device_id, hours);
        self.dispatch("set_profile", device_id, call).await
    }

    async fn dispatch(
        &self,
        action: &'static str,
        device_id: &str,
        call: impl Future<Output = Result<ApiResponse>>,
    ) -> Result<bool> {
        let response = match call.await {
            Ok(response) => response,
            Err(e) if e.is_configuration() => return Err(e),
            Err(e) => {
                warn!(action, device_id, error = %e, "command failed");
                return Ok(false);
            }
        };

        if !response.is_ok() {
            warn!(action, device_id, status = response.status, "command rejected");
            return Ok(false);
        }
        debug!(action, device_id, "command accepted");

        match self.refresh().await {
            Ok(true) => debug!(action, device_id, "state refreshed after command"),
            Ok(false) => debug!(action, device_id, "no refresh after command"),
            Err(e) => warn!(action, device_id, error = %e, "refresh after command failed"),
        }
        Ok(true)
    }
}
