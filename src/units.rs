// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Unit conversions for the imperial display used by the web client.

/// Kelvin to degrees Fahrenheit.
pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    kelvin * (9.0 / 5.0) - 459.67
}

/// Millimetres of precipitation to inches.
pub fn millimeters_to_inches(mm: f64) -> f64 {
    mm / 25.4
}

/// Meters/second to miles/hour.
pub fn meters_per_second_to_mph(mps: f64) -> f64 {
    mps * 2.237
}
