// =============================================================================
// API Module
// =============================================================================

pub mod rest;
