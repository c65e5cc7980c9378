//! Raw schedule payloads as returned by the booking API.

use serde::{Deserialize, Serialize};

/// Result of `getAvailableResourceScheduleInfo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInfo {
    #[serde(default)]
    pub schedule_of_day: Vec<ScheduleOfDay>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOfDay {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub schedule_by_slot: Vec<ScheduleBySlot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBySlot {
    #[serde(default)]
    pub slot: Vec<SlotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotEntry {
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// One existing appointment from `getAppointmentReceptionsByPatient`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reception {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_payload() {
        let body = r#"{
            "scheduleOfDay": [
                {
                    "date": "2025-01-05",
                    "scheduleBySlot": [
                        {"slot": [
                            {"startTime": "2025-01-05T09:00:00+03:00", "endTime": "2025-01-05T09:20:00+03:00"},
                            {"startTime": "2025-01-05T09:20:00+03:00"}
                        ]},
                        {}
                    ]
                }
            ]
        }"#;

        let info: ScheduleInfo = serde_json::from_str(body).unwrap();
        assert_eq!(info.schedule_of_day.len(), 1);
        let day = &info.schedule_of_day[0];
        assert_eq!(day.schedule_by_slot.len(), 2);
        assert_eq!(day.schedule_by_slot[0].slot.len(), 2);
        assert!(day.schedule_by_slot[1].slot.is_empty());
    }

    #[test]
    fn test_missing_days_is_empty() {
        let info: ScheduleInfo = serde_json::from_str("{}").unwrap();
        assert!(info.schedule_of_day.is_empty());
    }
}
