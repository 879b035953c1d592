//! Generate an assessment for validation testing

fn main() {
    let json = r#"{
        "metrics": {
            "alpha_relaxation": 1.8,
            "beta_concentration": 0.9,
            "theta_relaxation": 1.1,
            "engagement_index": 0.55,
            "arousal_index": 0.7,
            "frustration_index": 0.4,
            "mindfulness_index": 2.2
        },
        "mental_state": {
            "relaxation": "high",
            "concentration": "low",
            "calm": "medium",
            "engagement": "low",
            "arousal": "low",
            "frustration": "low",
            "mindfulness": "high"
        },
        "timestamp": 1705327200.0,
        "iterations_analyzed": 50
    }"#;

    match mindcity_flux::assess_summary(json.to_string()) {
        Ok(assessment) => print!("{assessment}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
