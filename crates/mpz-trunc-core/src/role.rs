use serde::{Deserialize, Serialize};

/// Role of a party in the truncation protocol.
///
/// The protocol is asymmetric: the shares of a single party mean nothing on
/// their own, only the sum of both parties' shares does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The designated party.
    ///
    /// Alice re-centers signed inputs by `2^(bw - 1)` and removes the
    /// corresponding offset from the output. Comparison inputs of Alice are
    /// used as they are.
    Alice,
    /// The other party.
    ///
    /// Bob complements his comparison inputs and applies the offset of the MSB
    /// heuristic.
    Bob,
}

impl Role {
    /// Returns `true` if this is the designated party.
    #[inline]
    pub fn is_alice(&self) -> bool {
        matches!(self, Role::Alice)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Alice => write!(f, "Alice"),
            Role::Bob => write!(f, "Bob"),
        }
    }
}
