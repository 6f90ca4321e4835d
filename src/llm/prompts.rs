//! Prompt text sent to the chat model.

use crate::nlp::Vitals;

use super::{ChatMessage, Role};

pub const ASSISTANT_PERSONA: &str = "You are AyurJanani, an assistant for questions about pregnancy and Ayurveda. \
Be accurate, polite and brief. Do not diagnose or give medical advice, and decline topics \
unrelated to pregnancy or Ayurveda.";

/// Opening turn of a new conversation.
pub fn persona() -> ChatMessage {
    ChatMessage::new(Role::System, ASSISTANT_PERSONA)
}

pub fn diet_plan(trimester: &str, weight_kg: f64, conditions: &str, preferences: &str) -> String {
    format!(
        "Suggest a one-day meal plan (breakfast, lunch, snacks, dinner, with portions) for a \
         pregnant woman in her {trimester} trimester weighing about {weight_kg} kg. \
         She reports: {conditions}. Dietary preferences that must be respected: {preferences}. \
         Favour safe Ayurvedic ingredients and avoid anything harmful in pregnancy."
    )
}

fn vital_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

/// Request for the four lifestyle sections read back by
/// [`super::sections::extract_section`].
pub fn lifestyle(recent_symptoms: &[String], vitals: Option<&Vitals>, postpartum: bool) -> String {
    let stage = if postpartum {
        "has recently given birth; focus on postpartum recovery"
    } else {
        "is pregnant"
    };
    let vitals = vitals.copied().unwrap_or_default();
    let symptoms = if recent_symptoms.is_empty() {
        "none reported".to_string()
    } else {
        recent_symptoms.join(", ")
    };
    format!(
        "The user {stage}. Answer with four labelled lines:\n\
         Self-care: one short daily self-care activity\n\
         Music: a suitable music type or genre\n\
         Exercise: one safe exercise\n\
         Ayurveda: one Ayurvedic tip\n\n\
         Recent symptoms: {symptoms}\n\
         Vitals: BP {}/{}, Glucose: {}, HR: {}",
        vital_or_na(vitals.systolic_bp),
        vital_or_na(vitals.diastolic_bp),
        vital_or_na(vitals.blood_glucose),
        vital_or_na(vitals.heart_rate),
    )
}
