//! Quest Pipeline
//!
//! Posting, party assembly, departure, resolution, expiry, dismissal and
//! retry. Party members move through the guest lifecycle as the quest does:
//! `AssignedToQuest` while the quest is posted, `Deployed` once it is
//! accepted, and back through the door when it resolves.

use tavern_events::{EventKind, SimTime};

use super::context::TavernCtx;
use super::lifecycle::{clear_seat, return_to_tavern};
use crate::components::guest::GuestState;
use crate::components::npc::{NpcId, Role};
use crate::components::quest::quest_constants::{MAX_PARTY_SIZE, SUCCESS_THRESHOLD};
use crate::components::quest::{
    expected_duration, match_score, pooled_stats, reward_multiplier, PostOutcome, Quest, QuestId,
    QuestOutcome, QuestStatus,
};
use crate::error::{declined, TavernError, TavernResult};

/// Happiness change for party members when a quest resolves
const RESOLUTION_HAPPINESS: i32 = 5;
const SUCCESS_RENOWN: f32 = 1.0;
const FAILURE_RENOWN: f32 = -0.5;

/// Rolls a new quest with a fresh id. Nothing is posted.
pub fn generate_quest(ctx: &mut TavernCtx, level: u32) -> Quest {
    let id = ctx.board.allocate_id();
    Quest::generate(&mut ctx.rng.0, id, level, &ctx.requirements, &ctx.config.quests)
}

/// Puts a quest on the board, or in the backlog when the board is full.
pub fn publish_quest(ctx: &mut TavernCtx, quest: Quest) -> PostOutcome {
    let id = quest.id;
    let poster = quest.poster.map(|p| p.0);
    let now = ctx.now();
    let outcome = ctx.board.post(quest, now);
    match outcome {
        PostOutcome::Posted => ctx.emit(EventKind::QuestPosted { quest: id.0, poster }),
        PostOutcome::Backlogged => ctx.emit(EventKind::QuestBacklogged { quest: id.0 }),
    }
    outcome
}

/// A quest giver on the floor posts a quest at their own level.
pub fn post_quest(ctx: &mut TavernCtx, poster: NpcId) -> TavernResult<QuestId> {
    let Some(npc) = ctx.registry.npc(poster) else {
        return declined(TavernError::UnknownNpc(poster));
    };
    if npc.role() != Role::QuestGiver {
        return declined(TavernError::NotAQuestGiver(poster));
    }
    let level = npc.level;
    let held = npc.posted_quest();

    let state = ctx.registry.guest_state(poster);
    if !state.map_or(false, GuestState::can_be_served) {
        return declined(TavernError::InvalidGuestState {
            npc: poster,
            state,
            action: "post a quest",
        });
    }
    if let Some(held) = held {
        let still_out = ctx.board.get(held).map_or(false, Quest::is_posted)
            || ctx.board.backlog().any(|q| q.id == held);
        if still_out {
            return declined(TavernError::InvalidGuestState {
                npc: poster,
                state,
                action: "post a second quest",
            });
        }
    }

    let mut quest = generate_quest(ctx, level);
    quest.poster = Some(poster);
    let id = quest.id;
    publish_quest(ctx, quest);
    if let Some(npc) = ctx.registry.npc_mut(poster) {
        npc.record_posting(id);
    }
    Ok(id)
}

/// Inside the tavern and free to head out.
fn is_present(state: Option<GuestState>) -> bool {
    matches!(
        state,
        Some(GuestState::TavernFloor) | Some(GuestState::Seats) | Some(GuestState::StagingArea)
    )
}

/// Checks that an NPC may join the party of `quest`.
fn check_member(ctx: &TavernCtx, quest: QuestId, npc: NpcId) -> TavernResult<()> {
    let Some(record) = ctx.registry.npc(npc) else {
        return declined(TavernError::UnknownNpc(npc));
    };
    if !record.is_adventurer() {
        return declined(TavernError::NotAnAdventurer(npc));
    }
    if let Some(other) = record.active_quest() {
        return declined(TavernError::AlreadyOnQuest { npc, quest: other });
    }
    if let Some(other) = ctx.board.quest_of(npc) {
        if other != quest {
            return declined(TavernError::AlreadyOnQuest { npc, quest: other });
        }
    }
    let state = ctx.registry.guest_state(npc);
    let present = match state {
        Some(GuestState::AssignedToQuest) => ctx.board.get(quest).map_or(false, |q| q.has_member(npc)),
        other => is_present(other),
    };
    if !present {
        return declined(TavernError::InvalidGuestState {
            npc,
            state,
            action: "join a party",
        });
    }
    Ok(())
}

/// Adds a guest to the party of a posted quest.
pub fn assign_to_quest(ctx: &mut TavernCtx, quest: QuestId, npc: NpcId) -> TavernResult<()> {
    let Some(entry) = ctx.board.get(quest) else {
        return declined(TavernError::UnknownQuest(quest));
    };
    if !entry.is_posted() {
        return declined(TavernError::InvalidQuestState {
            quest,
            status: entry.status,
            action: "take members",
        });
    }
    if entry.has_member(npc) {
        return Ok(());
    }
    if entry.open_slots() == 0 {
        return declined(TavernError::PartyFull(quest));
    }
    check_member(ctx, quest, npc)?;
    // Party members count against the floor while they wait
    let state = ctx.registry.guest_state(npc);
    if state == Some(GuestState::StagingArea) && !ctx.floor_has_room() {
        return declined(TavernError::InvalidGuestState {
            npc,
            state,
            action: "join a party while the floor is full",
        });
    }

    clear_seat(ctx, npc);
    ctx.scheduler.cancel_departure(npc);
    if let Some(guest) = ctx.registry.guest_mut(npc) {
        guest.state = GuestState::AssignedToQuest;
        guest.staged_at = None;
        guest.departs_at = None;
    }
    if let Some(entry) = ctx.board.get_mut(quest) {
        entry.party.push(npc);
    }
    tracing::debug!("Guest {} joins the party of {}", npc, quest);
    Ok(())
}

/// Takes a guest out of the party of a posted quest.
pub fn unassign_from_quest(ctx: &mut TavernCtx, quest: QuestId, npc: NpcId) -> TavernResult<()> {
    let Some(entry) = ctx.board.get(quest) else {
        return declined(TavernError::UnknownQuest(quest));
    };
    if !entry.is_posted() {
        return declined(TavernError::InvalidQuestState {
            quest,
            status: entry.status,
            action: "release members",
        });
    }
    if !entry.has_member(npc) {
        return declined(TavernError::NotInParty { npc, quest });
    }

    if let Some(entry) = ctx.board.get_mut(quest) {
        entry.party.retain(|m| *m != npc);
    }
    return_to_tavern(ctx, npc);
    Ok(())
}

/// Hours an accepted party will be away.
fn party_duration(ctx: &TavernCtx, quest: &Quest, party: &[NpcId]) -> u64 {
    let classes: Vec<&str> = party
        .iter()
        .filter_map(|m| ctx.registry.npc(*m))
        .filter_map(|n| n.class_id())
        .collect();
    let hours = expected_duration(
        quest.travel_time,
        quest.task_time,
        &classes,
        &ctx.config.quests.support_class,
    );
    (hours * 3600.0).round() as u64
}

/// Sends the party out: seats cleared, departures dropped, members deployed.
fn deploy(ctx: &mut TavernCtx, quest: QuestId, party: &[NpcId]) {
    for npc in party {
        clear_seat(ctx, *npc);
        ctx.scheduler.cancel_departure(*npc);
        if let Some(guest) = ctx.registry.guest_mut(*npc) {
            guest.state = GuestState::Deployed;
            guest.staged_at = None;
            guest.departs_at = None;
        }
        if let Some(record) = ctx.registry.npc_mut(*npc) {
            record.set_active_quest(Some(quest));
        }
    }
}

/// Locks the party of a posted quest and sends it out.
///
/// `party` adds members on top of anyone already assigned. Returns the
/// expected return time.
pub fn accept_quest(ctx: &mut TavernCtx, quest: QuestId, party: &[NpcId]) -> TavernResult<SimTime> {
    let Some(entry) = ctx.board.get(quest) else {
        return declined(TavernError::UnknownQuest(quest));
    };
    if !entry.is_posted() {
        return declined(TavernError::InvalidQuestState {
            quest,
            status: entry.status,
            action: "be accepted",
        });
    }

    let mut members = entry.party.clone();
    for npc in party {
        if members.contains(npc) {
            continue;
        }
        check_member(ctx, quest, *npc)?;
        members.push(*npc);
    }
    if members.is_empty() {
        return declined(TavernError::EmptyParty(quest));
    }
    if members.len() > MAX_PARTY_SIZE {
        return declined(TavernError::PartyFull(quest));
    }

    let now = ctx.now();
    let Some(entry) = ctx.board.get(quest) else {
        return declined(TavernError::UnknownQuest(quest));
    };
    let expected_return = now.plus_seconds(party_duration(ctx, entry, &members));
    let poster = entry.poster;

    deploy(ctx, quest, &members);
    if let Some(entry) = ctx.board.get_mut(quest) {
        entry.party = members.clone();
        entry.status = QuestStatus::Accepted;
        entry.accepted_at = Some(now);
        entry.expected_return = Some(expected_return);
    }
    if let Some(poster) = poster.and_then(|p| ctx.registry.npc_mut(p)) {
        poster.release_posting(quest);
    }

    ctx.emit(EventKind::QuestAccepted {
        quest: quest.0,
        party: members.iter().map(|m| m.0).collect(),
        expected_return,
    });
    tracing::info!("{} accepted by {} adventurers, back at {}", quest, members.len(), expected_return);
    Ok(expected_return)
}

/// Resolves every accepted quest whose party is due back and expires posted
/// quests past their deadline. Returns the resolved quest ids.
pub fn resolve_due_quests(ctx: &mut TavernCtx) -> Vec<QuestId> {
    let now = ctx.now();
    let due = ctx.board.due_quests(now);
    for quest in &due {
        resolve(ctx, *quest);
    }
    for quest in ctx.board.expired_quests(now) {
        expire(ctx, quest);
    }
    due
}

fn resolve(ctx: &mut TavernCtx, id: QuestId) {
    let now = ctx.now();
    let Some(quest) = ctx.board.get(id) else {
        return;
    };
    let party = quest.party.clone();
    let requirements = quest.requirements.clone();
    let (reward, xp_reward) = (quest.reward, quest.xp_reward);

    let pooled = pooled_stats(
        party
            .iter()
            .filter_map(|m| ctx.registry.npc(*m))
            .map(|n| &n.stats),
    );
    let score = match_score(&requirements, &pooled);
    let success = score >= SUCCESS_THRESHOLD;
    let (payout, xp_each) = if success {
        let multiplier = reward_multiplier(party.len());
        (
            (reward as f32 * multiplier).round() as u32,
            (xp_reward as f32 * multiplier).round() as u32,
        )
    } else {
        (0, 0)
    };

    ctx.tavern.gold += payout as i64;
    ctx.tavern
        .adjust_renown(if success { SUCCESS_RENOWN } else { FAILURE_RENOWN });

    for member in &party {
        let growth = ctx
            .registry
            .npc(*member)
            .and_then(|n| n.class_id())
            .map(|class| ctx.catalog.growth_for(class).to_vec())
            .unwrap_or_default();
        let Some(record) = ctx.registry.npc_mut(*member) else {
            continue;
        };
        let level_ups = record.gain_xp(xp_each, &growth, &mut ctx.rng.0);
        record.record_quest_result(success);
        record.adjust_happiness(if success {
            RESOLUTION_HAPPINESS
        } else {
            -RESOLUTION_HAPPINESS
        });
        for up in level_ups {
            ctx.emit(EventKind::LevelUp {
                npc: member.0,
                level: up.level,
                stat: up.stat.to_string(),
            });
        }
        return_to_tavern(ctx, *member);
    }

    if let Some(quest) = ctx.board.get_mut(id) {
        quest.status = QuestStatus::Resolved { failed: !success };
        quest.completed_at = Some(now);
        quest.outcome = Some(QuestOutcome {
            success,
            match_score: score,
            payout,
            xp_each,
        });
    }
    ctx.emit(EventKind::QuestResolved {
        quest: id.0,
        success,
        match_score: score,
        payout,
    });
    tracing::info!(
        "{} resolved: {} (score {:.2}, payout {})",
        id,
        if success { "success" } else { "failure" },
        score,
        payout
    );
}

/// Returns an unlocked party to the tavern and frees the poster.
fn release_party(ctx: &mut TavernCtx, id: QuestId) {
    let Some(quest) = ctx.board.get(id) else {
        return;
    };
    let party = quest.party.clone();
    let poster = quest.poster;
    for member in party {
        if let Some(record) = ctx.registry.npc_mut(member) {
            record.set_active_quest(None);
        }
        return_to_tavern(ctx, member);
    }
    if let Some(poster) = poster.and_then(|p| ctx.registry.npc_mut(p)) {
        poster.release_posting(id);
    }
    if let Some(quest) = ctx.board.get_mut(id) {
        quest.party.clear();
    }
}

/// Takes a quest off the board, announcing any backlog promotion.
fn take_down(ctx: &mut TavernCtx, id: QuestId) {
    let now = ctx.now();
    let (_, promoted) = ctx.board.remove(id, now);
    if let Some(promoted) = promoted {
        let poster = ctx.board.get(promoted).and_then(|q| q.poster).map(|p| p.0);
        ctx.emit(EventKind::QuestPosted {
            quest: promoted.0,
            poster,
        });
    }
}

fn expire(ctx: &mut TavernCtx, id: QuestId) {
    release_party(ctx, id);
    take_down(ctx, id);
    ctx.emit(EventKind::QuestExpired { quest: id.0 });
    tracing::info!("{} expired unaccepted", id);
}

/// Removes a quest from the board.
///
/// A posted quest releases its party; an accepted one is forfeited and its
/// party recalled with no payout; a resolved one is simply cleared.
pub fn dismiss_quest(ctx: &mut TavernCtx, id: QuestId) -> TavernResult<()> {
    let Some(quest) = ctx.board.get(id) else {
        return withdraw_backlogged(ctx, id);
    };
    match quest.status {
        QuestStatus::Posted | QuestStatus::Accepted => release_party(ctx, id),
        QuestStatus::Resolved { .. } | QuestStatus::Unposted => {}
    }
    take_down(ctx, id);
    ctx.emit(EventKind::QuestDismissed { quest: id.0 });
    Ok(())
}

/// Drops a quest that never reached the board.
fn withdraw_backlogged(ctx: &mut TavernCtx, id: QuestId) -> TavernResult<()> {
    let Some(quest) = ctx.board.remove_backlogged(id) else {
        return declined(TavernError::UnknownQuest(id));
    };
    if let Some(poster) = quest.poster.and_then(|p| ctx.registry.npc_mut(p)) {
        poster.release_posting(id);
    }
    ctx.emit(EventKind::QuestDismissed { quest: id.0 });
    Ok(())
}

/// Sends the same party back out on a failed quest for a fee.
///
/// Requirements are kept; start and return times are stamped anew.
pub fn retry_quest(ctx: &mut TavernCtx, id: QuestId) -> TavernResult<SimTime> {
    let Some(quest) = ctx.board.get(id) else {
        return declined(TavernError::UnknownQuest(id));
    };
    if !quest.is_failed() {
        return declined(TavernError::InvalidQuestState {
            quest: id,
            status: quest.status,
            action: "be retried",
        });
    }
    if quest.party.is_empty() {
        return declined(TavernError::EmptyParty(id));
    }
    let fee = quest.retry_fee();
    if !ctx.tavern.can_afford(fee as i64) {
        return declined(TavernError::InsufficientGold {
            needed: fee as i64,
            available: ctx.tavern.gold,
        });
    }

    let party = quest.party.clone();
    for member in &party {
        let Some(record) = ctx.registry.npc(*member) else {
            return declined(TavernError::UnknownNpc(*member));
        };
        if let Some(other) = record.active_quest().or_else(|| ctx.board.quest_of(*member)) {
            return declined(TavernError::AlreadyOnQuest {
                npc: *member,
                quest: other,
            });
        }
        let state = ctx.registry.guest_state(*member);
        if !is_present(state) {
            return declined(TavernError::InvalidGuestState {
                npc: *member,
                state,
                action: "rejoin the party",
            });
        }
    }

    let now = ctx.now();
    let expected_return = now.plus_seconds(party_duration(ctx, quest, &party));

    ctx.tavern.gold -= fee as i64;
    deploy(ctx, id, &party);
    if let Some(quest) = ctx.board.get_mut(id) {
        quest.status = QuestStatus::Accepted;
        quest.accepted_at = Some(now);
        quest.expected_return = Some(expected_return);
        quest.completed_at = None;
        quest.outcome = None;
        quest.retries += 1;
    }
    ctx.emit(EventKind::QuestRetried { quest: id.0, fee });
    tracing::info!("{} retried for {} gold", id, fee);
    Ok(expected_return)
}
