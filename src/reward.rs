//! Reward codes handed out when the human wins.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tictactoe_core::RandomSource;
use tracing::{debug, instrument};

/// Characters a code is drawn from. Leaves out 0, O, 1 and I.
pub const REWARD_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of every reward code.
pub const REWARD_CODE_LEN: usize = 5;

/// A short promo code, e.g. `K7WQ2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardCode(String);

impl RewardCode {
    /// Draws a fresh code from `rng`.
    #[instrument(skip(rng))]
    pub fn generate(rng: &mut impl RandomSource) -> Self {
        let code: String = (0..REWARD_CODE_LEN)
            .map(|_| char::from(REWARD_ALPHABET[rng.pick(REWARD_ALPHABET.len())]))
            .collect();
        debug!(code = %code, "Generated reward code");
        Self(code)
    }

    /// Checks that `s` has the shape of a code we could have issued.
    pub fn is_well_formed(s: &str) -> bool {
        s.len() == REWARD_CODE_LEN && s.bytes().all(|b| REWARD_ALPHABET.contains(&b))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
