//! Integration Tests Module
//!
//! End-to-end tests for the Agent Gate core: decision engine properties and
//! the full parse -> approve -> dispatch -> result pipeline over both tool
//! protocols.

// Decision engine properties and settings persistence
mod approval_test;

// Dispatch pipeline over the XML and native protocols
mod dispatch_test;
