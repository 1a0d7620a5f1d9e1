//! Custom assertions for plate check responses

use serde_json::Value;

/// Assert the response status
pub fn assert_status(response: &Value, expected: &str) {
    assert_eq!(
        response["status"], expected,
        "Expected status '{}' in response:\n{}",
        expected,
        serde_json::to_string_pretty(response).unwrap()
    );
}

/// Assert that the response carries no `details` key at all
pub fn assert_no_details(response: &Value) {
    assert!(
        response.get("details").is_none(),
        "Expected no details key in response:\n{}",
        serde_json::to_string_pretty(response).unwrap()
    );
}

/// Plate numbers listed in `details.plates`, in order
pub fn detail_plate_numbers(response: &Value) -> Vec<String> {
    response["details"]["plates"]
        .as_array()
        .map(|plates| {
            plates
                .iter()
                .filter_map(|p| p["plate_number"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
