use std::{future::Future, time::Duration};

use async_trait::async_trait;
use bon::Builder;
use derive_more::Display;
use tokio::time::sleep;

use crate::{core::error::Error, prelude::*, quantity::percent::Percent};

/// The seam between the reconciliation protocol and the vehicle cloud.
///
/// Implemented by [`crate::api::tesla::VehicleHandle`] and by an in-memory
/// fake in the tests below.
#[async_trait]
pub trait VehicleGateway: Send + Sync {
    async fn is_online(&self) -> Result<bool>;

    async fn wake(&self) -> Result<()>;

    async fn charge_limit(&self) -> Result<Percent>;

    async fn set_charge_limit(&self, percent: Percent) -> Result<()>;
}

/// Bounded wake-and-retry budget, injected rather than hard-coded.
#[derive(Copy, Clone, Debug)]
pub struct WakePolicy {
    /// Wake-and-poll attempts before giving up on the vehicle.
    pub attempts: u32,

    /// Pause between wake-and-poll attempts.
    pub poll_interval: Duration,

    /// Pause before the single retry of a failed state query.
    pub retry_backoff: Duration,
}

impl Default for WakePolicy {
    /// 20 × 30 s gives the vehicle roughly ten minutes to come online.
    fn default() -> Self {
        Self {
            attempts: 20,
            poll_interval: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(10),
        }
    }
}

/// How a run ended. All of these exit the process with zero.
#[derive(Debug, Display)]
pub enum Outcome {
    #[display("set the charge limit to {target} (was {previous})")]
    Reconciled { target: Percent, previous: Percent },

    #[display("trip mode is active ({current}), left the limit untouched")]
    TripModeSkipped { current: Percent },

    #[display("the vehicle never came online, leaving it to the next run")]
    TimedOut,
}

#[derive(Builder)]
pub struct Reconciler<'a, G> {
    gateway: &'a G,

    #[builder(default)]
    policy: WakePolicy,

    trip_threshold: Percent,

    /// Dry run: stop right before sending the command.
    #[builder(default)]
    scout: bool,
}

impl<G: VehicleGateway> Reconciler<'_, G> {
    /// Drive the vehicle through `unknown → waking → online` and apply the
    /// target, unless the operator's trip mode says hands off.
    #[instrument(skip_all, fields(target = %target))]
    pub async fn run(&self, target: Percent) -> Result<Outcome> {
        if !self.ensure_online().await? {
            warn!(attempts = self.policy.attempts, "the vehicle never came online, giving up");
            return Ok(Outcome::TimedOut);
        }

        let current = self
            .retry_once(|| self.gateway.charge_limit())
            .await
            .context("failed to read the charge limit")?;
        info!(%current, "the vehicle is online");

        if current > self.trip_threshold {
            info!(%current, trip_threshold = %self.trip_threshold, "trip mode, not touching it");
            return Ok(Outcome::TripModeSkipped { current });
        }

        if self.scout {
            info!(%target, "scouting, not sending the command");
        } else {
            // Sent even when the target equals the current limit: setting a
            // value to itself is not an error.
            match self.gateway.set_charge_limit(target).await {
                Ok(()) => info!(%target, "charge limit set"),
                Err(error) if is_fatal(&error) => return Err(error),
                Err(error) => return Err(error.context(Error::ActuationFailure)),
            }
        }
        Ok(Outcome::Reconciled { target, previous: current })
    }

    /// Wake-and-poll until the vehicle reports online, bounded by the policy.
    async fn ensure_online(&self) -> Result<bool> {
        if self.retry_once(|| self.gateway.is_online()).await? {
            return Ok(true);
        }
        info!("the vehicle is asleep, waking it up…");
        for attempt in 1..=self.policy.attempts {
            if let Err(error) = self.gateway.wake().await {
                if is_fatal(&error) {
                    return Err(error);
                }
                // The wake loop itself is the retry mechanism here.
                warn!(attempt, "wake request failed: {error:#}");
            }
            sleep(self.policy.poll_interval).await;
            match self.gateway.is_online().await {
                Ok(true) => {
                    debug!(attempt, "the vehicle came online");
                    return Ok(true);
                }
                Ok(false) => debug!(attempt, "still asleep"),
                Err(error) if is_fatal(&error) => return Err(error),
                Err(error) => warn!(attempt, "status query failed: {error:#}"),
            }
        }
        Ok(false)
    }

    /// Retry a transient state-query failure exactly once after the backoff.
    async fn retry_once<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match operation().await {
            Ok(value) => Ok(value),
            Err(error) if is_fatal(&error) => Err(error),
            Err(error) => {
                warn!(
                    backoff_secs = self.policy.retry_backoff.as_secs(),
                    "remote call failed, retrying once: {error:#}",
                );
                sleep(self.policy.retry_backoff).await;
                operation().await
            }
        }
    }
}

/// Credential rejections surface immediately: retrying them is useless.
fn is_fatal(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<Error>()
        .is_some_and(|error| matches!(error, Error::AuthFailure { .. }))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::error::AuthMode;

    #[derive(Default)]
    struct FakeVehicle {
        /// `is_online` calls answered `false` before the vehicle wakes up.
        asleep_for_polls: u32,

        charge_limit: Percent,

        /// `charge_limit` calls that fail before one succeeds.
        limit_read_failures: u32,

        /// Every `charge_limit` call fails with a credential rejection.
        reject_credentials: bool,

        /// Every `set_charge_limit` call is rejected.
        reject_commands: bool,

        polls: Mutex<u32>,
        wakes: Mutex<u32>,
        limit_reads: Mutex<u32>,
        sent: Mutex<Vec<Percent>>,
    }

    impl FakeVehicle {
        fn online(charge_limit: u8) -> Self {
            Self { charge_limit: Percent::new(charge_limit), ..Self::default() }
        }

        fn sent(&self) -> Vec<Percent> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VehicleGateway for FakeVehicle {
        async fn is_online(&self) -> Result<bool> {
            let mut polls = self.polls.lock().unwrap();
            *polls += 1;
            Ok(*polls > self.asleep_for_polls)
        }

        async fn wake(&self) -> Result<()> {
            *self.wakes.lock().unwrap() += 1;
            Ok(())
        }

        async fn charge_limit(&self) -> Result<Percent> {
            if self.reject_credentials {
                return Err(Error::AuthFailure { mode: AuthMode::Token }.into());
            }
            let mut reads = self.limit_reads.lock().unwrap();
            *reads += 1;
            if *reads <= self.limit_read_failures {
                bail!("the vehicle fell asleep again");
            }
            Ok(self.charge_limit)
        }

        async fn set_charge_limit(&self, percent: Percent) -> Result<()> {
            if self.reject_commands {
                bail!("could not set the charge limit");
            }
            self.sent.lock().unwrap().push(percent);
            Ok(())
        }
    }

    fn instant_policy() -> WakePolicy {
        WakePolicy { attempts: 3, poll_interval: Duration::ZERO, retry_backoff: Duration::ZERO }
    }

    fn reconciler(vehicle: &FakeVehicle) -> Reconciler<'_, FakeVehicle> {
        Reconciler::builder()
            .gateway(vehicle)
            .policy(instant_policy())
            .trip_threshold(Percent::new(90))
            .build()
    }

    #[tokio::test]
    async fn test_online_vehicle_gets_the_target() -> Result {
        let vehicle = FakeVehicle::online(60);
        let outcome = reconciler(&vehicle).run(Percent::new(90)).await?;
        assert!(matches!(outcome, Outcome::Reconciled { .. }));
        assert_eq!(vehicle.sent(), [Percent::new(90)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_limit_at_the_threshold_still_gets_the_command() -> Result {
        let vehicle = FakeVehicle::online(90);
        let outcome = reconciler(&vehicle).run(Percent::new(60)).await?;
        assert!(matches!(outcome, Outcome::Reconciled { .. }));
        assert_eq!(vehicle.sent(), [Percent::new(60)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_limit_above_the_threshold_is_trip_mode() -> Result {
        let vehicle = FakeVehicle::online(91);
        let outcome = reconciler(&vehicle).run(Percent::new(60)).await?;
        assert!(matches!(outcome, Outcome::TripModeSkipped { .. }));
        assert!(vehicle.sent().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_identical_target_is_sent_again() -> Result {
        let vehicle = FakeVehicle::online(60);
        let outcome = reconciler(&vehicle).run(Percent::new(60)).await?;
        assert!(matches!(outcome, Outcome::Reconciled { .. }));
        assert_eq!(vehicle.sent(), [Percent::new(60)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_sleeping_vehicle_is_woken_first() -> Result {
        let vehicle = FakeVehicle { asleep_for_polls: 2, ..FakeVehicle::online(60) };
        let outcome = reconciler(&vehicle).run(Percent::new(90)).await?;
        assert!(matches!(outcome, Outcome::Reconciled { .. }));
        assert!(*vehicle.wakes.lock().unwrap() >= 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_exhausted_attempts_time_out_without_a_command() -> Result {
        let vehicle = FakeVehicle { asleep_for_polls: u32::MAX, ..FakeVehicle::online(60) };
        let outcome = reconciler(&vehicle).run(Percent::new(90)).await?;
        assert!(matches!(outcome, Outcome::TimedOut));
        assert!(vehicle.sent().is_empty());
        assert_eq!(*vehicle.wakes.lock().unwrap(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_transient_limit_read_is_retried_once() -> Result {
        let vehicle = FakeVehicle { limit_read_failures: 1, ..FakeVehicle::online(60) };
        let outcome = reconciler(&vehicle).run(Percent::new(90)).await?;
        assert!(matches!(outcome, Outcome::Reconciled { .. }));
        assert_eq!(*vehicle.limit_reads.lock().unwrap(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_second_transient_failure_propagates() {
        let vehicle = FakeVehicle { limit_read_failures: 2, ..FakeVehicle::online(60) };
        let result = reconciler(&vehicle).run(Percent::new(90)).await;
        assert!(result.is_err());
        assert!(vehicle.sent().is_empty());
    }

    #[tokio::test]
    async fn test_credential_rejection_is_not_retried() {
        let vehicle = FakeVehicle { reject_credentials: true, ..FakeVehicle::online(60) };
        let error = reconciler(&vehicle).run(Percent::new(90)).await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::AuthFailure { mode: AuthMode::Token }),
        ));
    }

    #[tokio::test]
    async fn test_rejected_command_is_an_actuation_failure() {
        let vehicle = FakeVehicle { reject_commands: true, ..FakeVehicle::online(60) };
        let error = reconciler(&vehicle).run(Percent::new(90)).await.unwrap_err();
        assert!(matches!(error.downcast_ref::<Error>(), Some(Error::ActuationFailure)));
    }

    #[tokio::test]
    async fn test_scout_decides_but_does_not_touch() -> Result {
        let vehicle = FakeVehicle::online(60);
        let outcome = Reconciler::builder()
            .gateway(&vehicle)
            .policy(instant_policy())
            .trip_threshold(Percent::new(90))
            .scout(true)
            .build()
            .run(Percent::new(90))
            .await?;
        assert!(matches!(outcome, Outcome::Reconciled { .. }));
        assert!(vehicle.sent().is_empty());
        Ok(())
    }
}
