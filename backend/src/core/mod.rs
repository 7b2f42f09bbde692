//! Core definitions shared by every component: the engine unit system.

pub mod units;
