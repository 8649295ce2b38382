//! Mock Calendar Service for testing.
//!
//! Holds events in memory and hands out sequential ids (`evt-1`, `evt-2`, ...).
//! Deleting an unknown id returns `NotFound`, like a real calendar would.

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::domain::foundation::CalendarEventId;
use crate::domain::scheduling::Slot;
use crate::ports::{CalendarEventRequest, CalendarService, ServiceError};

#[derive(Debug, Default)]
struct Calendar {
    next_id: u64,
    events: BTreeMap<String, CalendarEventRequest>,
    deleted: Vec<CalendarEventId>,
    create_failures: VecDeque<ServiceError>,
    delete_failures: VecDeque<ServiceError>,
}

/// In-memory calendar with error injection.
#[derive(Debug, Clone, Default)]
pub struct MockCalendarService {
    calendar: Arc<Mutex<Calendar>>,
}

impl MockCalendarService {
    pub fn new() -> Self {
        Self::default()
    }

    fn calendar(&self) -> std::sync::MutexGuard<'_, Calendar> {
        self.calendar.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fails the next create call.
    pub fn with_create_failure(self, error: ServiceError) -> Self {
        self.fail_next_create(error);
        self
    }

    /// Fails the next delete call.
    pub fn with_delete_failure(self, error: ServiceError) -> Self {
        self.fail_next_delete(error);
        self
    }

    pub fn fail_next_create(&self, error: ServiceError) {
        self.calendar().create_failures.push_back(error);
    }

    pub fn fail_next_delete(&self, error: ServiceError) {
        self.calendar().delete_failures.push_back(error);
    }

    /// Events currently booked, ordered by id.
    pub fn events(&self) -> Vec<(CalendarEventId, CalendarEventRequest)> {
        self.calendar()
            .events
            .iter()
            .filter_map(|(id, req)| CalendarEventId::new(id.clone()).ok().map(|id| (id, req.clone())))
            .collect()
    }

    pub fn event(&self, id: &CalendarEventId) -> Option<CalendarEventRequest> {
        self.calendar().events.get(id.as_str()).cloned()
    }

    pub fn deleted(&self) -> Vec<CalendarEventId> {
        self.calendar().deleted.clone()
    }
}

#[async_trait]
impl CalendarService for MockCalendarService {
    async fn create_event(
        &self,
        request: &CalendarEventRequest,
    ) -> Result<CalendarEventId, ServiceError> {
        let mut calendar = self.calendar();
        if let Some(error) = calendar.create_failures.pop_front() {
            return Err(error);
        }
        calendar.next_id += 1;
        let raw = format!("evt-{}", calendar.next_id);
        let id = CalendarEventId::new(raw.clone()).map_err(|e| ServiceError::rejected(e.to_string()))?;
        calendar.events.insert(raw, request.clone());
        Ok(id)
    }

    async fn delete_event(&self, event_id: &CalendarEventId) -> Result<(), ServiceError> {
        let mut calendar = self.calendar();
        if let Some(error) = calendar.delete_failures.pop_front() {
            return Err(error);
        }
        match calendar.events.remove(event_id.as_str()) {
            Some(_) => {
                calendar.deleted.push(event_id.clone());
                Ok(())
            }
            None => Err(ServiceError::not_found(event_id.as_str())),
        }
    }

    async fn update_event(&self, event_id: &CalendarEventId, slot: &Slot) -> Result<(), ServiceError> {
        let mut calendar = self.calendar();
        match calendar.events.get_mut(event_id.as_str()) {
            Some(event) => {
                event.slot = *slot;
                Ok(())
            }
            None => Err(ServiceError::not_found(event_id.as_str())),
        }
    }
}
