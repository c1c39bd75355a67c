// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod message;
pub mod weather;

pub use activity::{ActivityList, ActivityRecord};
pub use message::{parse_client_message, MessageError, PushMessage};
pub use weather::{Coordinate, CurrentConditions, HourlyForecast, WeatherSnapshot};
