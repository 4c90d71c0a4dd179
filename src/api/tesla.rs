//! Tesla Owner API client.

pub mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Response as HttpResponse, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use self::models::{ChargeState, CommandResult, DriveState, Response, Vehicle};
use crate::{
    core::{
        error::{AuthMode, Error},
        reconcile::VehicleGateway,
    },
    prelude::*,
    quantity::percent::Percent,
};

const BASE_URL: &str = "https://owner-api.teslamotors.com";

// The stock Owner API client pair that every third-party integration ships
// with. These identify the app, not the account.
const CLIENT_ID: &str = "81527cff06843c8634fdc09e8ac0abefb46ac849f38fe1e431c2ef2106796384";
const CLIENT_SECRET: &str = "c7257eb71a564034f9419ee651c7d0e5f7aa6bfbd18bafb5c5c033b093bb2fa3";

pub struct Api {
    client: Client,
    auth_mode: AuthMode,
}

impl Api {
    pub fn with_token(access_token: &str) -> Result<Self> {
        Self::try_new(access_token, AuthMode::Token)
    }

    /// Exchange the username and password for an access token once, at
    /// construction.
    #[instrument(skip_all)]
    pub async fn with_credentials(email: &str, password: &str) -> Result<Self> {
        #[derive(Serialize)]
        struct TokenRequest<'a> {
            grant_type: &'a str,
            client_id: &'a str,
            client_secret: &'a str,
            email: &'a str,
            password: &'a str,
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        info!("requesting an access token…");
        let response = Client::builder()
            .user_agent("magpie")
            .timeout(Duration::from_secs(15))
            .build()?
            .post(format!("{BASE_URL}/oauth/token"))
            .json(&TokenRequest {
                grant_type: "password",
                client_id: CLIENT_ID,
                client_secret: CLIENT_SECRET,
                email,
                password,
            })
            .send()
            .await
            .context("failed to call the token endpoint")?;
        if is_rejected(response.status()) {
            return Err(Error::AuthFailure { mode: AuthMode::Password }.into());
        }
        let response: TokenResponse = response
            .error_for_status()
            .context("the token request failed")?
            .json()
            .await
            .context("failed to deserialize the token response")?;
        Self::try_new(&response.access_token, AuthMode::Password)
    }

    fn try_new(access_token: &str, auth_mode: AuthMode) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&format!("Bearer {access_token}"))?;
        authorization.set_sensitive(true);
        headers.append(AUTHORIZATION, authorization);
        let client = Client::builder()
            .user_agent("magpie")
            .timeout(Duration::from_secs(15))
            .default_headers(headers)
            .build()?;
        Ok(Self { client, auth_mode })
    }

    #[instrument(skip_all)]
    pub async fn vehicles(&self) -> Result<Vec<Vehicle>> {
        self.get("/api/1/vehicles").await.context("failed to list the vehicles")
    }

    #[instrument(skip_all, fields(vehicle_id = vehicle_id))]
    pub async fn vehicle(&self, vehicle_id: u64) -> Result<Vehicle> {
        self.get(&format!("/api/1/vehicles/{vehicle_id}"))
            .await
            .context("failed to query the vehicle")
    }

    #[instrument(skip_all, fields(vehicle_id = vehicle_id))]
    pub async fn wake_up(&self, vehicle_id: u64) -> Result<Vehicle> {
        let path = format!("/api/1/vehicles/{vehicle_id}/wake_up");
        let response = self
            .client
            .post(format!("{BASE_URL}{path}"))
            .send()
            .await
            .context("failed to call the wake endpoint")?;
        self.read(&path, response).await.context("failed to wake the vehicle")
    }

    #[instrument(skip_all, fields(vehicle_id = vehicle_id))]
    pub async fn charge_state(&self, vehicle_id: u64) -> Result<ChargeState> {
        self.get(&format!("/api/1/vehicles/{vehicle_id}/data_request/charge_state"))
            .await
            .context("failed to read the charge state")
    }

    #[instrument(skip_all, fields(vehicle_id = vehicle_id))]
    pub async fn drive_state(&self, vehicle_id: u64) -> Result<DriveState> {
        self.get(&format!("/api/1/vehicles/{vehicle_id}/data_request/drive_state"))
            .await
            .context("failed to read the drive state")
    }

    #[instrument(skip_all, fields(vehicle_id = vehicle_id, percent = %percent))]
    pub async fn set_charge_limit(&self, vehicle_id: u64, percent: Percent) -> Result<()> {
        #[derive(Serialize)]
        struct SetChargeLimitRequest {
            percent: Percent,
        }

        info!("setting…");
        let path = format!("/api/1/vehicles/{vehicle_id}/command/set_charge_limit");
        let response = self
            .client
            .post(format!("{BASE_URL}{path}"))
            .json(&SetChargeLimitRequest { percent })
            .send()
            .await
            .context("failed to call the command endpoint")?;
        let verdict: CommandResult = self.read(&path, response).await?;
        if !verdict.result {
            bail!(
                "the command was rejected: {reason}",
                reason = verdict.reason.as_deref().unwrap_or("no reason given"),
            );
        }
        Ok(())
    }

    #[must_use]
    pub const fn handle(&self, vehicle_id: u64) -> VehicleHandle<'_> {
        VehicleHandle { api: self, vehicle_id }
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let response = self
            .client
            .get(format!("{BASE_URL}{path}"))
            .send()
            .await
            .with_context(|| format!("failed to call `{path}`"))?;
        self.read(path, response).await
    }

    async fn read<R: DeserializeOwned>(&self, path: &str, response: HttpResponse) -> Result<R> {
        if is_rejected(response.status()) {
            return Err(Error::AuthFailure { mode: self.auth_mode }.into());
        }
        Ok(response
            .error_for_status()
            .with_context(|| format!("`{path}` request failed"))?
            .json::<Response<R>>()
            .await
            .with_context(|| format!("failed to deserialize the `{path}` response"))?
            .response)
    }
}

fn is_rejected(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// One account-scoped client, one vehicle: what the reconciler talks to.
pub struct VehicleHandle<'a> {
    api: &'a Api,
    vehicle_id: u64,
}

#[async_trait]
impl VehicleGateway for VehicleHandle<'_> {
    async fn is_online(&self) -> Result<bool> {
        Ok(self.api.vehicle(self.vehicle_id).await?.is_online())
    }

    async fn wake(&self) -> Result<()> {
        self.api.wake_up(self.vehicle_id).await?;
        Ok(())
    }

    async fn charge_limit(&self) -> Result<Percent> {
        Ok(self.api.charge_state(self.vehicle_id).await?.charge_limit)
    }

    async fn set_charge_limit(&self, percent: Percent) -> Result<()> {
        self.api.set_charge_limit(self.vehicle_id, percent).await
    }
}
