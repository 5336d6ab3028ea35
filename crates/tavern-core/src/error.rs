//! Error Types
//!
//! Every rejected operation leaves state unchanged and returns one of these.

use thiserror::Error;

use crate::components::guest::GuestState;
use crate::components::npc::NpcId;
use crate::components::quest::{QuestId, QuestStatus};
use crate::components::seating::SeatRef;

/// Why an operation against the tavern was declined.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TavernError {
    #[error("npc {0} does not exist")]
    UnknownNpc(NpcId),

    #[error("quest {0} does not exist")]
    UnknownQuest(QuestId),

    #[error("unknown item '{0}'")]
    UnknownItem(String),

    #[error("seat {0} does not exist")]
    UnknownSeat(SeatRef),

    #[error("npc {npc} cannot {action} while {state:?}")]
    InvalidGuestState {
        npc: NpcId,
        state: Option<GuestState>,
        action: &'static str,
    },

    #[error("quest {quest} cannot {action} while {status:?}")]
    InvalidQuestState {
        quest: QuestId,
        status: QuestStatus,
        action: &'static str,
    },

    #[error("npc {0} is not an adventurer")]
    NotAnAdventurer(NpcId),

    #[error("npc {0} is not a quest giver")]
    NotAQuestGiver(NpcId),

    #[error("npc {npc} is already committed to quest {quest}")]
    AlreadyOnQuest { npc: NpcId, quest: QuestId },

    #[error("npc {npc} is not in the party of quest {quest}")]
    NotInParty { npc: NpcId, quest: QuestId },

    #[error("quest {0} already has a full party")]
    PartyFull(QuestId),

    #[error("quest {0} has no party")]
    EmptyParty(QuestId),

    #[error("seat {0} is already taken")]
    SeatTaken(SeatRef),

    #[error("the tavern is closed")]
    TavernClosed,

    #[error("not enough gold: need {needed}, have {available}")]
    InsufficientGold { needed: i64, available: i64 },

    #[error("'{0}' is out of stock")]
    OutOfStock(String),

    #[error("'{0}' is not for sale")]
    NotPurchasable(String),

    #[error("npc {npc} will not pay {asking} (max {max_price:.1})")]
    PriceRejected {
        npc: NpcId,
        asking: u32,
        max_price: f32,
    },
}

pub type TavernResult<T> = Result<T, TavernError>;

/// Logs a declined operation and returns it as an error.
pub(crate) fn declined<T>(err: TavernError) -> TavernResult<T> {
    tracing::warn!("Declined: {}", err);
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TavernError::InsufficientGold {
            needed: 15,
            available: 3,
        };
        assert_eq!(err.to_string(), "not enough gold: need 15, have 3");

        let err = TavernError::InvalidGuestState {
            npc: NpcId(4),
            state: None,
            action: "be admitted",
        };
        assert_eq!(err.to_string(), "npc #4 cannot be admitted while None");
    }
}
