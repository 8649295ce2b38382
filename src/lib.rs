//! Interview Scheduler - conversational interview scheduling engine
//!
//! Negotiates interview times between one interviewer and several
//! interviewees over an asynchronous chat channel: collects the
//! interviewer's availability, offers slots one at a time, books accepted
//! slots, escalates when the pool runs dry, and raises attention flags for
//! stalled conversations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
