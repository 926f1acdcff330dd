use crate::dataset::ScenarioRecord;

/// Sent by the connectivity check.
pub const PROBE_PROMPT: &str = "What book have you read recently?";

/// The instruction for one scenario plus the terser fallback used once a
/// backend has returned an empty completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub full: String,
    pub simplified: String,
}

impl Prompt {
    pub fn for_scenario(rec: &ScenarioRecord) -> Self {
        Self {
            full: build_prompt(rec),
            simplified: build_simplified_prompt(rec),
        }
    }

    /// A prompt without a separate fallback.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self { simplified: text.clone(), full: text }
    }

    pub fn text(&self, simplified: bool) -> &str {
        if simplified {
            &self.simplified
        } else {
            &self.full
        }
    }
}

pub fn build_prompt(rec: &ScenarioRecord) -> String {
    format!(
        "Given the following scenario, identify the emotion of the subject and the cause of that emotion.\n\n\
         Scenario: {scenario}\n\n\
         Subject: {subject}\n\n\
         Emotion choices: {emotions}\n\n\
         Cause choices: {causes}\n\n\
         Provide your answer in JSON format with two fields: \"emotion\" and \"cause\".\n",
        scenario = rec.scenario,
        subject = rec.subject,
        emotions = rec.emotion_choices.join(", "),
        causes = rec.cause_choices.join(", "),
    )
}

pub fn build_simplified_prompt(rec: &ScenarioRecord) -> String {
    format!(
        "Scenario: {scenario}\n\
         Subject: {subject}\n\n\
         Pick exactly one emotion from: {emotions}\n\
         Pick exactly one cause from: {causes}\n\n\
         Reply with ONLY this JSON object and nothing else:\n\
         {{\"emotion\": \"<emotion>\", \"cause\": \"<cause>\"}}",
        scenario = rec.scenario,
        subject = rec.subject,
        emotions = rec.emotion_choices.join(", "),
        causes = rec.cause_choices.join(", "),
    )
}
