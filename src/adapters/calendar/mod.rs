//! Calendar Adapters
//!
//! - **MockCalendarService** - In-memory calendar (testing/development)

mod mock_calendar_service;

pub use mock_calendar_service::MockCalendarService;
