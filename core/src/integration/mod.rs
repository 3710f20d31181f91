//! Integration tests for the harness
//!
//! Drive a full [`Session`](crate::Session) over the fixture module from
//! `test_utils`: startup, dimension changes, fullscreen round trips, input
//! forwarding, frame publication and sound triggers.
