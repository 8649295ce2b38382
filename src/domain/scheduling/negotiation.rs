//! Multi-party slot negotiation over the shared pool.
//!
//! Interviewees progress in parallel: every one that is waiting gets the
//! earliest slot it has not tried, a decline frees the slot for the others,
//! and a slot disappears once every unscheduled interviewee has declined it.
//! `advance` drives all of this to a fixed point after each event.

use std::collections::BTreeSet;

use crate::domain::foundation::{ParticipantId, Timestamp};

use super::{
    CompletionReason, Conversation, ParticipantEvent, ParticipantState, SchedulingError,
    SideEffect, Slot,
};

impl Conversation {
    /// Available slots the interviewee has never been offered.
    pub fn untried_slots(&self, id: &ParticipantId) -> Result<Vec<Slot>, SchedulingError> {
        let p = self.interviewee(id)?;
        Ok(self
            .pool()
            .available()
            .iter()
            .filter(|s| !p.has_been_offered(&s.key()))
            .copied()
            .collect())
    }

    fn has_untried(&self, id: &ParticipantId) -> Result<bool, SchedulingError> {
        let p = self.interviewee(id)?;
        Ok(self.pool().has_untried(p.offered_slots()))
    }

    /// Proposes the earliest untried slot to a waiting interviewee.
    ///
    /// With nothing untried the interviewee moves to NO_SLOTS_AVAILABLE.
    pub fn offer(&mut self, id: &ParticipantId) -> Result<Vec<SideEffect>, SchedulingError> {
        self.ensure_active()?;
        let candidate = {
            let p = self.interviewee(id)?;
            self.pool().earliest_untried(p.offered_slots())
        };

        let Some(slot) = candidate else {
            return self.apply(id, ParticipantEvent::PoolExhausted);
        };

        let effects = self.apply(id, ParticipantEvent::SlotOffered { slot })?;
        self.pool_mut().reserve(&slot.key());
        self.interviewee_mut(id)?.hold(slot);
        Ok(effects)
    }

    /// Books the interviewee's proposed slot.
    pub fn accept(&mut self, id: &ParticipantId) -> Result<Vec<SideEffect>, SchedulingError> {
        self.ensure_active()?;
        let slot = self
            .interviewee(id)?
            .proposed_slot()
            .ok_or_else(|| SchedulingError::NoProposedSlot(id.clone()))?;

        let effects = self.apply(id, ParticipantEvent::OfferAccepted { slot })?;
        self.pool_mut().commit(slot);
        self.interviewee_mut(id)?.book(slot);
        Ok(effects)
    }

    /// Releases the proposed slot and records the denial.
    pub fn decline(&mut self, id: &ParticipantId) -> Result<Vec<SideEffect>, SchedulingError> {
        self.ensure_active()?;
        let slot = self
            .interviewee(id)?
            .proposed_slot()
            .ok_or_else(|| SchedulingError::NoProposedSlot(id.clone()))?;
        let key = slot.key();

        // The declined slot is already in offered_slots, so releasing it
        // does not change this interviewee's untried set.
        let untried_remaining = self.has_untried(id)?;
        let effects = self.apply(id, ParticipantEvent::OfferDeclined { untried_remaining })?;

        self.interviewee_mut(id)?.release_hold();
        let pool = self.pool_mut();
        pool.release(&key);
        pool.record_denial(key, id.clone());

        let unscheduled = self.unscheduled_ids();
        self.pool_mut().prune_denied(&unscheduled);
        Ok(effects)
    }

    /// Withdraws an interviewee. Any held slot goes back to the pool; a
    /// booked slot stays in `scheduled` and its calendar event is deleted.
    pub fn cancel(&mut self, id: &ParticipantId) -> Result<Vec<SideEffect>, SchedulingError> {
        self.ensure_active()?;
        let effects = self.apply(id, ParticipantEvent::Cancelled)?;

        let p = self.interviewee_mut(id)?;
        let held = p.release_hold();
        p.unbook();
        p.count_cancellation();

        if let Some(slot) = held {
            self.pool_mut().release(&slot.key());
        }
        Ok(effects)
    }

    /// Reopens negotiation for a scheduled interviewee.
    pub fn reschedule(&mut self, id: &ParticipantId) -> Result<Vec<SideEffect>, SchedulingError> {
        self.ensure_active()?;
        let effects = self.apply(id, ParticipantEvent::RescheduleRequested)?;

        let p = self.interviewee_mut(id)?;
        p.unbook();
        p.count_reschedule();
        Ok(effects)
    }

    /// Drives negotiation to a fixed point, then escalates or completes.
    ///
    /// Calling it again with no intervening event changes nothing.
    pub fn advance(
        &mut self,
        max_more_slot_requests: u32,
        now: Timestamp,
    ) -> Result<Vec<SideEffect>, SchedulingError> {
        let mut effects = Vec::new();
        if !self.is_active() {
            return Ok(effects);
        }

        if self.is_pool_open() {
            loop {
                let mut changed = false;

                let unscheduled = self.unscheduled_ids();
                if !self.pool_mut().prune_denied(&unscheduled).is_empty() {
                    changed = true;
                }

                for id in self.interviewee_ids() {
                    let p = self.interviewee(&id)?;
                    let state = p.state();
                    let has_timezone = p.timezone().is_some();
                    let has_untried = self.has_untried(&id)?;

                    match state {
                        ParticipantState::NoSlotsAvailable if has_untried => {
                            effects.extend(self.apply(&id, ParticipantEvent::PoolReplenished)?);
                            changed = true;
                        }
                        ParticipantState::AwaitingAvailability if has_timezone => {
                            effects.extend(self.offer(&id)?);
                            changed = true;
                        }
                        _ => {}
                    }
                }

                if !changed {
                    break;
                }
            }

            if let Some(waiting) = self.stuck_interviewees() {
                if self.more_slots_requests() < max_more_slot_requests {
                    let attempt = self.count_more_slots_request();
                    let interviewer = self.interviewer().id().clone();
                    effects.extend(self.apply(
                        &interviewer,
                        ParticipantEvent::MoreSlotsRequested { attempt, waiting },
                    )?);
                } else {
                    effects.push(self.complete(CompletionReason::EscalationExhausted, now)?);
                    return Ok(effects);
                }
            }
        }

        if self.all_interviewees_settled() {
            effects.push(self.complete(CompletionReason::AllSettled, now)?);
        }
        Ok(effects)
    }

    /// Names of interviewees the pool cannot serve, when escalation applies.
    ///
    /// Escalation needs an idle interviewer and nobody holding a proposal,
    /// otherwise a pending answer may still free a slot.
    fn stuck_interviewees(&self) -> Option<Vec<String>> {
        if self.interviewer().state() != ParticipantState::ConversationActive {
            return None;
        }
        if self
            .interviewees()
            .iter()
            .any(|p| p.state() == ParticipantState::ConfirmationPending)
        {
            return None;
        }
        let waiting: Vec<String> = self
            .interviewees()
            .iter()
            .filter(|p| p.state() == ParticipantState::NoSlotsAvailable)
            .map(|p| p.name().to_string())
            .collect();
        (!waiting.is_empty()).then_some(waiting)
    }

    /// True if the pool satisfies its structural invariants.
    ///
    /// Used by tests and debug assertions after every mutation.
    pub fn pool_is_consistent(&self) -> bool {
        let pool = self.pool();
        let disjoint = pool
            .available()
            .iter()
            .all(|s| !pool.is_reserved(&s.key()));
        let scheduled_gone = pool
            .scheduled()
            .iter()
            .all(|s| !pool.is_available(&s.key()) && !pool.is_reserved(&s.key()));

        let holders: BTreeSet<_> = self
            .interviewees()
            .iter()
            .filter_map(|p| p.proposed_slot().map(|s| s.key()))
            .collect();
        let reserved: BTreeSet<_> = pool.reserved().iter().map(Slot::key).collect();
        let one_holder_each = holders == reserved
            && holders.len()
                == self
                    .interviewees()
                    .iter()
                    .filter(|p| p.proposed_slot().is_some())
                    .count();

        disjoint && scheduled_gone && one_holder_each
    }
}
