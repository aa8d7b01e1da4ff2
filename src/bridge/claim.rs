//! Exclusive ownership of a role's writer side
//!
//! Each role sets one bit in the preamble's claim word when it binds and
//! clears it again when its endpoints drop. A second bind of the same role
//! fails with [`BridgeError::RoleInUse`] instead of silently producing two
//! writers for one channel.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{BridgeError, Result},
    layout::{BridgeRegion, ROLE_CLAIMS_OFFSET},
};

/// The two processes a bridge connects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Client,
    Renderer,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Renderer => "renderer",
        }
    }

    /// This role's bit in the claim word
    pub fn bit(self) -> u32 {
        match self {
            Role::Client => 1 << 0,
            Role::Renderer => 1 << 1,
        }
    }
}

/// A held role; released on drop
#[derive(Debug)]
pub(crate) struct RoleClaim {
    region: Arc<BridgeRegion>,
    role: Role,
}

impl RoleClaim {
    /// Claim `role`, failing if it is already held
    ///
    /// With `reclaim` a held claim is taken over instead. That is only sound
    /// when the previous holder died without shutting down.
    pub(crate) fn acquire(region: Arc<BridgeRegion>, role: Role, reclaim: bool) -> Result<Self> {
        let view = region.view();
        let bit = role.bit();
        let mut current = region.role_claims()?;

        loop {
            if current & bit != 0 {
                if !reclaim {
                    return Err(BridgeError::RoleInUse { role: role.name() });
                }
                warn!(
                    "taking over the {} role of '{}'",
                    role.name(),
                    region.name()
                );
                break;
            }
            match view.compare_exchange_u32(ROLE_CLAIMS_OFFSET, current, current | bit)? {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        debug!("claimed {} role of '{}'", role.name(), region.name());
        Ok(Self { region, role })
    }

    fn release(&self) -> Result<()> {
        let view = self.region.view();
        let bit = self.role.bit();
        let mut current = self.region.role_claims()?;
        while current & bit != 0 {
            match view.compare_exchange_u32(ROLE_CLAIMS_OFFSET, current, current & !bit)? {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        Ok(())
    }
}

impl Drop for RoleClaim {
    fn drop(&mut self) {
        match self.release() {
            Ok(()) => debug!(
                "released {} role of '{}'",
                self.role.name(),
                self.region.name()
            ),
            Err(e) => warn!("failed to release {} role: {}", self.role.name(), e),
        }
    }
}
