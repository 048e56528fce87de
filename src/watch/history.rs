//! Reading history and display bands for the watch client

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt;

use crate::reading::Reading;

/// Number of readings kept by default
pub const DEFAULT_HISTORY_LEN: usize = 20;

/// A reading with the local time it arrived
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub received_at: DateTime<Local>,
    pub reading: Reading,
}

impl HistoryEntry {
    /// Table cells: time, temperature, humidity, unit name
    pub fn row(&self) -> [String; 4] {
        [
            self.received_at.format("%H:%M:%S").to_string(),
            format!("{:.1}{}", self.reading.temperature, self.reading.unit),
            format!("{:.1}%", self.reading.humidity),
            self.reading.unit.name().to_string(),
        ]
    }
}

/// Bounded, newest-first reading history
#[derive(Debug, Clone)]
pub struct ReadingHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl ReadingHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a reading, evicting the oldest once full
    pub fn push(&mut self, reading: Reading, received_at: DateTime<Local>) -> &HistoryEntry {
        self.entries.push_front(HistoryEntry {
            received_at,
            reading,
        });
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }

    /// Most recent reading
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ReadingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

/// Temperature comfort band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    Cold,
    Comfortable,
    Hot,
}

impl TemperatureBand {
    /// Above 25 is hot, below 15 is cold
    pub fn classify(temperature: f64) -> Self {
        if temperature > 25.0 {
            TemperatureBand::Hot
        } else if temperature < 15.0 {
            TemperatureBand::Cold
        } else {
            TemperatureBand::Comfortable
        }
    }
}

impl fmt::Display for TemperatureBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            TemperatureBand::Cold => "cold",
            TemperatureBand::Comfortable => "comfortable",
            TemperatureBand::Hot => "hot",
        })
    }
}

/// Humidity band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumidityBand {
    Dry,
    Normal,
    Humid,
}

impl HumidityBand {
    /// Above 70 is humid, below 30 is dry
    pub fn classify(humidity: f64) -> Self {
        if humidity > 70.0 {
            HumidityBand::Humid
        } else if humidity < 30.0 {
            HumidityBand::Dry
        } else {
            HumidityBand::Normal
        }
    }
}

impl fmt::Display for HumidityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            HumidityBand::Dry => "dry",
            HumidityBand::Normal => "normal",
            HumidityBand::Humid => "humid",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Unit;

    fn reading(temperature: f64) -> Reading {
        Reading::new(temperature, 50.0, Unit::Celsius)
    }

    #[test]
    fn test_history_is_bounded_newest_first() {
        let mut history = ReadingHistory::default();
        for i in 0..25 {
            history.push(reading(i as f64), Local::now());
        }

        assert_eq!(history.len(), DEFAULT_HISTORY_LEN);
        assert_eq!(history.latest().unwrap().reading.temperature, 24.0);
        let temps: Vec<f64> = history.iter().map(|e| e.reading.temperature).collect();
        assert_eq!(temps.first(), Some(&24.0));
        assert_eq!(temps.last(), Some(&5.0));
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut history = ReadingHistory::new(0);
        history.push(reading(1.0), Local::now());
        history.push(reading(2.0), Local::now());
        assert_eq!(history.len(), 1);
        assert_eq!(history.capacity(), 1);
    }

    #[test]
    fn test_row_format() {
        let mut history = ReadingHistory::default();
        let entry = history.push(Reading::new(21.56, 48.0, Unit::Fahrenheit), Local::now());
        let row = entry.row();
        assert_eq!(row[1], "21.6°F");
        assert_eq!(row[2], "48.0%");
        assert_eq!(row[3], "Fahrenheit");
    }

    #[test]
    fn test_bands() {
        assert_eq!(TemperatureBand::classify(25.5), TemperatureBand::Hot);
        assert_eq!(TemperatureBand::classify(25.0), TemperatureBand::Comfortable);
        assert_eq!(TemperatureBand::classify(14.9), TemperatureBand::Cold);
        assert_eq!(HumidityBand::classify(71.0), HumidityBand::Humid);
        assert_eq!(HumidityBand::classify(30.0), HumidityBand::Normal);
        assert_eq!(HumidityBand::classify(10.0), HumidityBand::Dry);
    }
}
